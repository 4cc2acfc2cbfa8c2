pub mod advertisement;
pub mod agent;
pub mod config;
pub mod coordinator;
pub mod device;
mod error;
pub mod gatt;
pub mod lifecycle;
pub mod peripheral;
pub mod short_uuid;
pub mod thermometer;

pub use coordinator::{Coordinator, Profile, State, Trigger};
pub use error::*;
pub use short_uuid::SdpShortUuid;
