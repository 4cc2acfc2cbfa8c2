use super::properties::Properties;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Descriptor {
    pub(crate) uuid: Uuid,
    pub(crate) properties: Properties,
    pub(crate) value: Vec<u8>,
}

impl Descriptor {
    pub fn new(uuid: Uuid, properties: Properties) -> Self {
        Descriptor {
            uuid,
            properties,
            value: Vec::new(),
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
}
