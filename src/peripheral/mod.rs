//! The seam between the coordinator and the system Bluetooth stack.

mod controller;
mod event;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod bluez;
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use bluez::BluezTransport as DefaultTransport;

pub use self::{
    controller::AdapterController,
    event::{Event, EventReceiver, EventSender},
};

use crate::{
    advertisement::Advertisement,
    agent::Agent,
    gatt::{Application, Notification},
    Error,
};

/// A local controller as exposed by the transport.
///
/// Registration calls are plain commands; the transport does not need to
/// guard against duplicates, [`AdapterController`] does.
#[allow(async_fn_in_trait)]
pub trait Adapter {
    fn path(self: &Self) -> &str;

    async fn is_powered(self: &Self) -> Result<bool, Error>;

    /// Requests power on. Completion arrives as [`Event::PoweredChanged`].
    async fn power_on(self: &Self) -> Result<(), Error>;

    async fn register_agent(self: &Self, agent: &Agent) -> Result<(), Error>;

    async fn unregister_agent(self: &Self, agent: &Agent) -> Result<(), Error>;

    async fn register_advertisement(self: &Self, advertisement: &Advertisement) -> Result<(), Error>;

    async fn unregister_advertisement(self: &Self, advertisement: &Advertisement) -> Result<(), Error>;

    async fn register_application(self: &Self, application: &Application) -> Result<(), Error>;

    async fn unregister_application(self: &Self, application: &Application) -> Result<(), Error>;

    async fn notify(self: &Self, notification: &Notification) -> Result<(), Error>;

    /// Drops every transport resource held for this adapter.
    async fn release(self: Self);
}

#[allow(async_fn_in_trait)]
pub trait Transport {
    type Adapter: Adapter;

    /// Connects to the system stack and looks up the default adapter.
    ///
    /// `Ok(None)` means the stack is reachable but has no usable adapter.
    /// Inbound events for the returned adapter are delivered to `events`.
    async fn default_adapter(self: &Self, events: EventSender) -> Result<Option<Self::Adapter>, Error>;

    /// Closes the system connection.
    async fn close(self: &Self);
}
