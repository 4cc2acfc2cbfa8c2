use log::{debug, info};
use uuid::Uuid;

use super::{
    event::{AttError, Notification, ReadRequest, Response, WriteRequest},
    handler::{NotifySubscriptionHandler, ReadHandler, WriteHandler},
    properties::Properties,
    service::Service,
    store::ValueStore,
};
use crate::Error;

/// The local GATT server: the declared attribute tree, its values and the
/// handlers that mediate every remote access.
#[derive(Default)]
pub struct Application {
    store: ValueStore,
    read_handler: Option<Box<dyn ReadHandler>>,
    write_handler: Option<Box<dyn WriteHandler>>,
    notify_handler: Option<Box<dyn NotifySubscriptionHandler>>,
}

impl Application {
    pub fn new() -> Self {
        Application::default()
    }

    pub fn add_service(self: &mut Self, service: Uuid) -> Result<(), Error> {
        self.store.add_service(service)
    }

    pub fn add_characteristic(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        properties: Properties,
    ) -> Result<(), Error> {
        self.store
            .add_characteristic(service, characteristic, properties)
    }

    pub fn add_descriptor(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        descriptor: Uuid,
        properties: Properties,
    ) -> Result<(), Error> {
        self.store
            .add_descriptor(service, characteristic, descriptor, properties)
    }

    pub fn set_characteristic_value<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        value: V,
    ) -> Result<(), Error> {
        self.store
            .set_characteristic_value(service, characteristic, value)
    }

    pub fn set_descriptor_value<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        descriptor: Uuid,
        value: V,
    ) -> Result<(), Error> {
        self.store
            .set_descriptor_value(service, characteristic, descriptor, value)
    }

    pub fn characteristic_value(self: &Self, service: Uuid, characteristic: Uuid) -> Option<&[u8]> {
        self.store.characteristic_value(service, characteristic)
    }

    pub fn descriptor_value(
        self: &Self,
        service: Uuid,
        characteristic: Uuid,
        descriptor: Uuid,
    ) -> Option<&[u8]> {
        self.store
            .descriptor_value(service, characteristic, descriptor)
    }

    pub fn services(self: &Self) -> &[Service] {
        self.store.services()
    }

    pub fn store(self: &Self) -> &ValueStore {
        &self.store
    }

    pub fn set_read_handler<H: ReadHandler + 'static>(self: &mut Self, handler: H) {
        self.read_handler = Some(Box::new(handler));
    }

    pub fn set_write_handler<H: WriteHandler + 'static>(self: &mut Self, handler: H) {
        self.write_handler = Some(Box::new(handler));
    }

    pub fn set_notify_handler<H: NotifySubscriptionHandler + 'static>(self: &mut Self, handler: H) {
        self.notify_handler = Some(Box::new(handler));
    }

    pub fn on_read_request(self: &mut Self, request: &ReadRequest) -> Response {
        let attribute = request.attribute;
        if attribute.is_descriptor() {
            return self.store.read(&attribute, request.offset);
        }

        let previous = self
            .store
            .characteristic_value(attribute.service, attribute.characteristic)
            .ok_or(AttError::Failed)?
            .to_vec();

        if let Some(handler) = self.read_handler.as_mut() {
            if let Err(err) = handler.on_read_request(&mut self.store, request) {
                info!("read of {} {}", attribute, err);
                // A rejected read never leaves a lazily filled value behind.
                self.store
                    .commit(&attribute, 0, &previous)
                    .map_err(|_| AttError::Failed)?;
                return Err(err);
            }
        }

        self.store.read(&attribute, request.offset)
    }

    pub fn on_write_request(self: &mut Self, request: &WriteRequest) -> Response {
        let attribute = request.attribute;
        debug!(
            "write request {} with value <{}>",
            attribute,
            hex::encode(&request.value)
        );
        self.store.check_write(&attribute, request.offset)?;

        if attribute.is_descriptor() {
            self.store
                .commit(&attribute, request.offset, &request.value)?;
            return Ok(Vec::new());
        }

        if let Some(handler) = self.write_handler.as_mut() {
            if let Err(err) = handler.on_write_request(&self.store, request) {
                info!("write of {} {}", attribute, err);
                return Err(err);
            }
        }

        self.store
            .commit(&attribute, request.offset, &request.value)?;
        if let Some(handler) = self.write_handler.as_mut() {
            handler.on_write_completed(attribute.service, attribute.characteristic, &request.value);
        }
        Ok(Vec::new())
    }

    pub fn on_notify_subscribe(self: &mut Self, service: Uuid, characteristic: Uuid) -> Result<(), AttError> {
        self.store.subscribe(service, characteristic)?;
        debug!("<{}> notifications on", characteristic);
        if let Some(handler) = self.notify_handler.as_mut() {
            handler.on_notify_subscribe(&mut self.store, service, characteristic);
        }
        Ok(())
    }

    pub fn on_notify_unsubscribe(self: &mut Self, service: Uuid, characteristic: Uuid) {
        if !self.store.unsubscribe(service, characteristic) {
            return;
        }
        debug!("<{}> notifications off", characteristic);
        if let Some(handler) = self.notify_handler.as_mut() {
            handler.on_notify_unsubscribe(&mut self.store, service, characteristic);
        }
    }

    pub fn notify<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        value: V,
    ) -> Result<(), Error> {
        self.store.notify(service, characteristic, value)
    }

    pub fn is_notifying(self: &Self, service: Uuid, characteristic: Uuid) -> bool {
        self.store.is_notifying(service, characteristic)
    }

    pub fn take_notifications(self: &mut Self) -> Vec<Notification> {
        self.store.take_notifications()
    }
}
