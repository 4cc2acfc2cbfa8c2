use super::{descriptor::Descriptor, properties::Properties};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Characteristic {
    pub(crate) uuid: Uuid,
    pub(crate) properties: Properties,
    pub(crate) value: Vec<u8>,
    pub(crate) descriptors: Vec<Descriptor>,
}

impl Characteristic {
    pub fn new(uuid: Uuid, properties: Properties) -> Self {
        Characteristic {
            uuid,
            properties,
            value: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    pub fn uuid(self: &Self) -> Uuid {
        self.uuid
    }

    pub fn properties(self: &Self) -> Properties {
        self.properties
    }

    pub fn value(self: &Self) -> &[u8] {
        &self.value
    }

    pub fn descriptors(self: &Self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn descriptor(self: &Self, uuid: Uuid) -> Option<&Descriptor> {
        self.descriptors.iter().find(|descriptor| descriptor.uuid == uuid)
    }

    pub(crate) fn descriptor_mut(self: &mut Self, uuid: Uuid) -> Option<&mut Descriptor> {
        self.descriptors
            .iter_mut()
            .find(|descriptor| descriptor.uuid == uuid)
    }
}
