use log::debug;
use std::collections::HashSet;
use uuid::Uuid;

use super::{
    characteristic::Characteristic,
    descriptor::Descriptor,
    event::{AttError, Attribute, Notification},
    properties::Properties,
    service::Service,
};
use crate::{Error, ErrorType};

fn gatt_error<T: Into<String>>(name: &str, description: T) -> Error {
    Error::new(name, description, ErrorType::Gatt)
}

/// Characteristic and descriptor values plus the set of active subscriptions.
///
/// Values change only through the local seeding calls, [`ValueStore::notify`]
/// and the validated write path of [`super::Application`].
#[derive(Debug, Default)]
pub struct ValueStore {
    services: Vec<Service>,
    subscriptions: HashSet<(Uuid, Uuid)>,
    notifications: Vec<Notification>,
}

impl ValueStore {
    pub fn new() -> Self {
        ValueStore::default()
    }

    pub fn services(self: &Self) -> &[Service] {
        &self.services
    }

    pub fn service(self: &Self, uuid: Uuid) -> Option<&Service> {
        self.services.iter().find(|service| service.uuid == uuid)
    }

    pub fn add_service(self: &mut Self, uuid: Uuid) -> Result<(), Error> {
        if self.service(uuid).is_some() {
            return Err(gatt_error(
                "DuplicateService",
                format!("service <{}> already declared", uuid),
            ));
        }
        self.services.push(Service::new(uuid, true));
        Ok(())
    }

    pub fn add_characteristic(
        self: &mut Self,
        service: Uuid,
        uuid: Uuid,
        properties: Properties,
    ) -> Result<(), Error> {
        let service = self.service_mut(service)?;
        if service.characteristic(uuid).is_some() {
            return Err(gatt_error(
                "DuplicateCharacteristic",
                format!("characteristic <{}> already declared in <{}>", uuid, service.uuid),
            ));
        }
        service
            .characteristics
            .push(Characteristic::new(uuid, properties));
        Ok(())
    }

    pub fn add_descriptor(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        uuid: Uuid,
        properties: Properties,
    ) -> Result<(), Error> {
        let characteristic = self.characteristic_mut(service, characteristic)?;
        if characteristic.descriptor(uuid).is_some() {
            return Err(gatt_error(
                "DuplicateDescriptor",
                format!(
                    "descriptor <{}> already declared in <{}>",
                    uuid, characteristic.uuid
                ),
            ));
        }
        characteristic
            .descriptors
            .push(Descriptor::new(uuid, properties));
        Ok(())
    }

    pub fn characteristic_value(self: &Self, service: Uuid, characteristic: Uuid) -> Option<&[u8]> {
        self.service(service)?
            .characteristic(characteristic)
            .map(Characteristic::value)
    }

    pub fn descriptor_value(
        self: &Self,
        service: Uuid,
        characteristic: Uuid,
        descriptor: Uuid,
    ) -> Option<&[u8]> {
        self.service(service)?
            .characteristic(characteristic)?
            .descriptor(descriptor)
            .map(Descriptor::value)
    }

    pub fn set_characteristic_value<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        value: V,
    ) -> Result<(), Error> {
        self.characteristic_mut(service, characteristic)?.value = value.into();
        Ok(())
    }

    pub fn set_descriptor_value<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        descriptor: Uuid,
        value: V,
    ) -> Result<(), Error> {
        let characteristic = self.characteristic_mut(service, characteristic)?;
        let characteristic_uuid = characteristic.uuid;
        let descriptor = characteristic.descriptor_mut(descriptor).ok_or_else(|| {
            gatt_error(
                "UnknownDescriptor",
                format!("<{}> has no descriptor <{}>", characteristic_uuid, descriptor),
            )
        })?;
        descriptor.value = value.into();
        Ok(())
    }

    pub fn is_notifying(self: &Self, service: Uuid, characteristic: Uuid) -> bool {
        self.subscriptions.contains(&(service, characteristic))
    }

    /// Stores `value` and queues it for every subscribed central.
    ///
    /// Fails without touching the stored value when nobody is subscribed.
    pub fn notify<V: Into<Vec<u8>>>(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
        value: V,
    ) -> Result<(), Error> {
        if !self.is_notifying(service, characteristic) {
            debug!("<{}> has no subscribers, dropping notification", characteristic);
            return Err(gatt_error(
                "NotNotifying",
                format!("<{}> has no subscribers", characteristic),
            ));
        }
        let value = value.into();
        self.set_characteristic_value(service, characteristic, value.clone())?;
        self.notifications.push(Notification {
            service,
            characteristic,
            value,
        });
        Ok(())
    }

    /// Drains the notifications queued since the last call.
    pub fn take_notifications(self: &mut Self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub(crate) fn subscribe(self: &mut Self, service: Uuid, characteristic: Uuid) -> Result<(), AttError> {
        let properties = self
            .find_characteristic(service, characteristic)
            .ok_or(AttError::Failed)?
            .properties;
        if !properties.can_push() {
            return Err(AttError::NotSupported);
        }
        self.subscriptions.insert((service, characteristic));
        Ok(())
    }

    pub(crate) fn unsubscribe(self: &mut Self, service: Uuid, characteristic: Uuid) -> bool {
        self.subscriptions.remove(&(service, characteristic))
    }

    /// Current value of `attribute` starting at `offset`.
    pub(crate) fn read(self: &Self, attribute: &Attribute, offset: u16) -> Result<Vec<u8>, AttError> {
        let value = self.access(attribute, Properties::is_readable)?;
        let offset = offset as usize;
        if offset > value.len() {
            return Err(AttError::InvalidOffset);
        }
        Ok(value[offset..].to_vec())
    }

    /// Checks that a write of `attribute` at `offset` could be committed.
    pub(crate) fn check_write(self: &Self, attribute: &Attribute, offset: u16) -> Result<(), AttError> {
        let value = self.access(attribute, Properties::is_writable)?;
        if offset as usize > value.len() {
            return Err(AttError::InvalidOffset);
        }
        Ok(())
    }

    /// Splices `bytes` into the value of `attribute` at `offset` and returns
    /// the committed value. Callers run [`ValueStore::check_write`] first.
    pub(crate) fn commit(
        self: &mut Self,
        attribute: &Attribute,
        offset: u16,
        bytes: &[u8],
    ) -> Result<Vec<u8>, AttError> {
        let characteristic = self
            .services
            .iter_mut()
            .find(|service| service.uuid == attribute.service)
            .and_then(|service| service.characteristic_mut(attribute.characteristic))
            .ok_or(AttError::Failed)?;
        let value = match attribute.descriptor {
            Some(uuid) => {
                &mut characteristic
                    .descriptor_mut(uuid)
                    .ok_or(AttError::Failed)?
                    .value
            }
            None => &mut characteristic.value,
        };
        let offset = offset as usize;
        if offset > value.len() {
            return Err(AttError::InvalidOffset);
        }
        value.truncate(offset);
        value.extend_from_slice(bytes);
        Ok(value.clone())
    }

    // Characteristic access is left to the handlers; descriptors are plain
    // storage and answer to their own flags.
    fn access(
        self: &Self,
        attribute: &Attribute,
        allowed: fn(&Properties) -> bool,
    ) -> Result<&[u8], AttError> {
        let characteristic = self
            .find_characteristic(attribute.service, attribute.characteristic)
            .ok_or(AttError::Failed)?;
        match attribute.descriptor {
            Some(uuid) => {
                let descriptor = characteristic.descriptor(uuid).ok_or(AttError::Failed)?;
                if !allowed(&descriptor.properties) {
                    return Err(AttError::NotPermitted);
                }
                Ok(descriptor.value.as_slice())
            }
            None => Ok(characteristic.value.as_slice()),
        }
    }

    fn find_characteristic(self: &Self, service: Uuid, characteristic: Uuid) -> Option<&Characteristic> {
        self.service(service)?.characteristic(characteristic)
    }

    fn service_mut(self: &mut Self, uuid: Uuid) -> Result<&mut Service, Error> {
        self.services
            .iter_mut()
            .find(|service| service.uuid == uuid)
            .ok_or_else(|| gatt_error("UnknownService", format!("no service <{}>", uuid)))
    }

    fn characteristic_mut(
        self: &mut Self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Result<&mut Characteristic, Error> {
        self.service_mut(service)?
            .characteristic_mut(characteristic)
            .ok_or_else(|| {
                gatt_error(
                    "UnknownCharacteristic",
                    format!("<{}> has no characteristic <{}>", service, characteristic),
                )
            })
    }
}
