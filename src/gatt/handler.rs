//! Capabilities an application plugs into the GATT callback contract.
//!
//! Each role is its own trait so a profile can implement only what it needs
//! and tests can substitute deterministic doubles.

use uuid::Uuid;

use super::{
    event::{AttError, ReadRequest, WriteRequest},
    store::ValueStore,
};

pub trait ReadHandler {
    /// Runs before a characteristic read is answered from the store.
    ///
    /// The handler may fill the value lazily through `store`. Returning an
    /// error aborts the read and the error is what the central sees.
    fn on_read_request(
        self: &mut Self,
        store: &mut ValueStore,
        request: &ReadRequest,
    ) -> Result<(), AttError>;
}

pub trait WriteHandler {
    /// Validates the proposed bytes before they are committed.
    fn on_write_request(
        self: &mut Self,
        store: &ValueStore,
        request: &WriteRequest,
    ) -> Result<(), AttError>;

    /// Observes a committed write. `value` holds the bytes that were written.
    fn on_write_completed(self: &mut Self, _service: Uuid, _characteristic: Uuid, _value: &[u8]) {}
}

pub trait NotifySubscriptionHandler {
    fn on_notify_subscribe(self: &mut Self, store: &mut ValueStore, service: Uuid, characteristic: Uuid);

    fn on_notify_unsubscribe(
        self: &mut Self,
        _store: &mut ValueStore,
        _service: Uuid,
        _characteristic: Uuid,
    ) {
    }
}
