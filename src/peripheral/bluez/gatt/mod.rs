mod application;
mod characteristic;
mod descriptor;
mod flags;
mod service;

use dbus::{
    arg::{prop_cast, PropMap, RefArg, Variant},
    channel::Sender,
    message::SignalArgs,
    nonblock::stdintf::org_freedesktop_dbus::PropertiesPropertiesChanged,
    MethodErr, Path,
};
use dbus_crossroads::Crossroads;
use futures::channel::oneshot;
use std::collections::HashMap;
use uuid::Uuid;

pub use self::application::{register, unregister};
use self::{
    characteristic::CharacteristicData, descriptor::DescriptorData, service::ServiceData,
};
use super::{
    connection::Connection,
    constants::{BLUEZ_ERROR_FAILED, GATT_CHARACTERISTIC_IFACE, PATH_BASE},
    device::address_from_path,
};
use crate::{
    gatt::{Application, Attribute, Response},
    peripheral::{Event, EventSender},
    Error, ErrorType,
};

/// Object paths of a GATT application exported into the object tree.
#[derive(Debug)]
pub struct Registration {
    pub object_path: Path<'static>,
    objects: Vec<Path<'static>>,
    characteristics: HashMap<(Uuid, Uuid), Path<'static>>,
}

impl Registration {
    pub fn characteristic_path(
        self: &Self,
        service: Uuid,
        characteristic: Uuid,
    ) -> Option<&Path<'static>> {
        self.characteristics.get(&(service, characteristic))
    }

    /// Removes every exported object, leaves first.
    pub fn remove(self: Self, cr: &mut Crossroads) {
        for path in self.objects.iter().rev() {
            cr.remove::<()>(path);
        }
    }
}

/// Exports `application` as an object tree rooted at the application path:
/// `service0000/characteristic0000/descriptor0000` and so on.
pub fn export(cr: &mut Crossroads, application: &Application, events: &EventSender) -> Registration {
    let object_path: Path<'static> = PATH_BASE.into();
    let object_manager = cr.object_manager();
    cr.insert(object_path.clone(), &[object_manager], ());

    let service_iface = service::register_interface(cr);
    let characteristic_iface = characteristic::register_interface(cr);
    let descriptor_iface = descriptor::register_interface(cr);

    let mut registration = Registration {
        object_path: object_path.clone(),
        objects: vec![object_path],
        characteristics: HashMap::new(),
    };

    for (service_index, service) in application.services().iter().enumerate() {
        let service_path: Path<'static> =
            format!("{}/service{:04}", PATH_BASE, service_index).into();
        cr.insert(
            service_path.clone(),
            &[service_iface],
            ServiceData::new(service),
        );
        registration.objects.push(service_path.clone());

        for (characteristic_index, characteristic) in service.characteristics().iter().enumerate() {
            let characteristic_path: Path<'static> =
                format!("{}/characteristic{:04}", service_path, characteristic_index).into();
            cr.insert(
                characteristic_path.clone(),
                &[characteristic_iface],
                CharacteristicData::new(
                    service.uuid(),
                    characteristic,
                    service_path.clone(),
                    events.clone(),
                ),
            );
            registration.objects.push(characteristic_path.clone());
            registration.characteristics.insert(
                (service.uuid(), characteristic.uuid()),
                characteristic_path.clone(),
            );

            for (descriptor_index, descriptor) in characteristic.descriptors().iter().enumerate() {
                let descriptor_path: Path<'static> =
                    format!("{}/descriptor{:04}", characteristic_path, descriptor_index).into();
                cr.insert(
                    descriptor_path.clone(),
                    &[descriptor_iface],
                    DescriptorData::new(
                        Attribute::descriptor(
                            service.uuid(),
                            characteristic.uuid(),
                            descriptor.uuid(),
                        ),
                        descriptor,
                        characteristic_path.clone(),
                        events.clone(),
                    ),
                );
                registration.objects.push(descriptor_path);
            }
        }
    }

    registration
}

/// Pushes `value` to subscribers through a `Value` change on the
/// characteristic object.
pub fn notify(connection: &Connection, characteristic: &Path<'static>, value: &[u8]) -> Result<(), Error> {
    let mut changed_properties = PropMap::new();
    changed_properties.insert(
        "Value".to_owned(),
        Variant(Box::new(value.to_vec()) as Box<dyn RefArg>),
    );
    let signal = PropertiesPropertiesChanged {
        interface_name: GATT_CHARACTERISTIC_IFACE.to_owned(),
        changed_properties,
        invalidated_properties: Vec::new(),
    };

    connection
        .default
        .send(signal.to_emit_message(characteristic))
        .map(|_| ())
        .map_err(|_| {
            Error::new(
                BLUEZ_ERROR_FAILED,
                format!("failed to send notification on '{}'", characteristic),
                ErrorType::Bluez,
            )
        })
}

/// `device`, `mtu` and `offset` from the options of a read or write call.
fn read_options(options: &PropMap) -> (Option<String>, u16, u16) {
    let device = prop_cast::<Path<'static>>(options, "device")
        .and_then(|device| address_from_path(device));
    let mtu = prop_cast::<u16>(options, "mtu").copied().unwrap_or(0);
    let offset = prop_cast::<u16>(options, "offset").copied().unwrap_or(0);
    (device, mtu, offset)
}

/// Hands `event` to the coordinator and waits for its answer.
async fn forward(
    events: EventSender,
    event: Event,
    response: oneshot::Receiver<Response>,
) -> Result<Vec<u8>, MethodErr> {
    events
        .unbounded_send(event)
        .map_err(|_| MethodErr::from((BLUEZ_ERROR_FAILED, "peripheral is shutting down")))?;

    match response.await {
        Ok(result) => result.map_err(MethodErr::from),
        Err(_) => Err(MethodErr::from((BLUEZ_ERROR_FAILED, "request abandoned"))),
    }
}
