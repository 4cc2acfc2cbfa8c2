use super::characteristic::Characteristic;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Service {
    pub(crate) uuid: Uuid,
    pub(crate) primary: bool,
    pub(crate) characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(uuid: Uuid, primary: bool) -> Self {
        Service {
            uuid,
            primary,
            characteristics: Vec::new(),
        }
    }

    pub fn uuid(self: &Self) -> Uuid {
        self.uuid
    }

    pub fn is_primary(self: &Self) -> bool {
        self.primary
    }

    /// Characteristics in declaration order.
    pub fn characteristics(self: &Self) -> &[Characteristic] {
        &self.characteristics
    }

    pub fn characteristic(self: &Self, uuid: Uuid) -> Option<&Characteristic> {
        self.characteristics
            .iter()
            .find(|characteristic| characteristic.uuid == uuid)
    }

    pub(crate) fn characteristic_mut(self: &mut Self, uuid: Uuid) -> Option<&mut Characteristic> {
        self.characteristics
            .iter_mut()
            .find(|characteristic| characteristic.uuid == uuid)
    }
}
