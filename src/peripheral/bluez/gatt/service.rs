use dbus_crossroads::{Crossroads, IfaceBuilder, IfaceToken};

use super::super::constants::GATT_SERVICE_IFACE;
use crate::gatt::Service;

pub struct ServiceData {
    uuid: String,
    primary: bool,
}

impl ServiceData {
    pub fn new(service: &Service) -> Self {
        ServiceData {
            uuid: service.uuid().to_string(),
            primary: service.is_primary(),
        }
    }
}

pub fn register_interface(cr: &mut Crossroads) -> IfaceToken<ServiceData> {
    cr.register(GATT_SERVICE_IFACE, |b: &mut IfaceBuilder<ServiceData>| {
        b.property::<String, _>("UUID")
            .get(|_, service| Ok(service.uuid.clone()));
        b.property::<bool, _>("Primary")
            .get(|_, service| Ok(service.primary));
    })
}
