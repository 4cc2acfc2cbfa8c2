/// Generic Attributes (GATT)
mod application;
pub mod characteristic;
pub mod descriptor;
pub mod event;
pub mod handler;
pub mod properties;
pub mod service;
mod store;

pub use self::{
    application::Application,
    characteristic::Characteristic,
    descriptor::Descriptor,
    event::{AttError, Attribute, Notification, ReadRequest, Response, WriteRequest},
    handler::{NotifySubscriptionHandler, ReadHandler, WriteHandler},
    properties::Properties,
    service::Service,
    store::ValueStore,
};
