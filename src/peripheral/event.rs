use futures::channel::{mpsc, oneshot};

use crate::{
    agent::PasskeyReply,
    device::Device,
    gatt::{event::ResponseSender, Attribute, ReadRequest, WriteRequest},
};

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Everything the transport reports to the coordinator.
///
/// Requests that expect an answer carry their responder; dropping it
/// unanswered fails the request on the remote side.
#[derive(Debug)]
pub enum Event {
    PoweredChanged {
        adapter: String,
        powered: bool,
    },
    CentralStateChanged(Device),
    Read {
        request: ReadRequest,
        response: ResponseSender,
    },
    Write {
        request: WriteRequest,
        response: ResponseSender,
    },
    NotifySubscribe(Attribute),
    NotifyUnsubscribe(Attribute),
    AuthorizationRequest {
        device: Device,
        response: oneshot::Sender<bool>,
    },
    PasskeyRequest {
        device: Device,
        reply: PasskeyReply,
    },
}
