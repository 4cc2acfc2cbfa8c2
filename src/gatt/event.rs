use futures::channel::oneshot;
use std::fmt;
use uuid::Uuid;

pub type Response = Result<Vec<u8>, AttError>;
pub type ResponseSender = oneshot::Sender<Response>;

/// Addresses a characteristic, or one of its descriptors, inside a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub service: Uuid,
    pub characteristic: Uuid,
    pub descriptor: Option<Uuid>,
}

impl Attribute {
    pub fn characteristic(service: Uuid, characteristic: Uuid) -> Self {
        Attribute {
            service,
            characteristic,
            descriptor: None,
        }
    }

    pub fn descriptor(service: Uuid, characteristic: Uuid, descriptor: Uuid) -> Self {
        Attribute {
            service,
            characteristic,
            descriptor: Some(descriptor),
        }
    }

    pub fn is_descriptor(self: &Self) -> bool {
        self.descriptor.is_some()
    }
}

impl fmt::Display for Attribute {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.descriptor {
            Some(descriptor) => write!(
                f,
                "<{}>/<{}>/<{}>",
                self.service, self.characteristic, descriptor
            ),
            None => write!(f, "<{}>/<{}>", self.service, self.characteristic),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub attribute: Attribute,
    /// Address of the requesting central, when the transport reports it.
    pub device: Option<String>,
    pub mtu: u16,
    pub offset: u16,
}

#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub attribute: Attribute,
    pub device: Option<String>,
    pub value: Vec<u8>,
    pub mtu: u16,
    pub offset: u16,
}

/// A value pushed to subscribed centrals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub service: Uuid,
    pub characteristic: Uuid,
    pub value: Vec<u8>,
}

/// Failures reported back to the remote side of a read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    Rejected,
    NotPermitted,
    InvalidOffset,
    NotSupported,
    Failed,
}

impl fmt::Display for AttError {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AttError::Rejected => "rejected",
            AttError::NotPermitted => "not permitted",
            AttError::InvalidOffset => "invalid offset",
            AttError::NotSupported => "not supported",
            AttError::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl std::error::Error for AttError {}
