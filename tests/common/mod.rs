#![allow(dead_code)]

use htsd::{
    advertisement::Advertisement,
    agent::{Agent, PairingHandler, PasskeyReply},
    device::{ConnectionState, Device},
    gatt::{Application, Notification},
    peripheral::{Adapter, EventSender, Transport},
    Error, ErrorType,
};
use futures::future;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

pub const ADAPTER_PATH: &str = "/org/bluez/hci0";
pub const DEVICE_PATH: &str = "/org/bluez/hci0/dev_00_1A_7D_DA_71_13";
pub const DEVICE_ADDRESS: &str = "00:1A:7D:DA:71:13";

/// Everything the coordinator asked of the mock stack, in order.
#[derive(Debug, Default)]
pub struct Journal {
    pub calls: Vec<&'static str>,
    pub notifications: Vec<Notification>,
    pub powered: bool,
    pub advertising: bool,
}

impl Journal {
    pub fn count(self: &Self, call: &str) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    /// Calls made from the first occurrence of `call` on.
    pub fn since(self: &Self, call: &str) -> Vec<&'static str> {
        match self.calls.iter().position(|c| *c == call) {
            Some(index) => self.calls[index..].to_vec(),
            None => Vec::new(),
        }
    }
}

pub type SharedJournal = Arc<Mutex<Journal>>;

pub struct MockTransport {
    journal: SharedJournal,
    has_adapter: bool,
    failures: Arc<HashSet<&'static str>>,
    hangs: Arc<HashSet<&'static str>>,
}

impl MockTransport {
    pub fn new() -> (Self, SharedJournal) {
        let journal = SharedJournal::default();
        let transport = MockTransport {
            journal: journal.clone(),
            has_adapter: true,
            failures: Arc::new(HashSet::new()),
            hangs: Arc::new(HashSet::new()),
        };
        (transport, journal)
    }

    pub fn without_adapter() -> (Self, SharedJournal) {
        let (mut transport, journal) = MockTransport::new();
        transport.has_adapter = false;
        (transport, journal)
    }

    /// Makes every call named `call` fail.
    pub fn failing(mut self: Self, call: &'static str) -> Self {
        let mut failures = (*self.failures).clone();
        failures.insert(call);
        self.failures = Arc::new(failures);
        self
    }

    /// Makes every call named `call` never complete.
    pub fn hanging(mut self: Self, call: &'static str) -> Self {
        let mut hangs = (*self.hangs).clone();
        hangs.insert(call);
        self.hangs = Arc::new(hangs);
        self
    }

    pub fn powered(self: Self) -> Self {
        self.journal.lock().unwrap().powered = true;
        self
    }
}

impl Transport for MockTransport {
    type Adapter = MockAdapter;

    async fn default_adapter(self: &Self, _events: EventSender) -> Result<Option<MockAdapter>, Error> {
        self.journal.lock().unwrap().calls.push("default_adapter");
        if self.hangs.contains("default_adapter") {
            future::pending::<()>().await;
        }
        if !self.has_adapter {
            return Ok(None);
        }
        Ok(Some(MockAdapter {
            journal: self.journal.clone(),
            failures: self.failures.clone(),
            hangs: self.hangs.clone(),
        }))
    }

    async fn close(self: &Self) {
        self.journal.lock().unwrap().calls.push("close");
    }
}

pub struct MockAdapter {
    journal: SharedJournal,
    failures: Arc<HashSet<&'static str>>,
    hangs: Arc<HashSet<&'static str>>,
}

impl MockAdapter {
    async fn record(self: &Self, call: &'static str) -> Result<(), Error> {
        self.journal.lock().unwrap().calls.push(call);
        if self.hangs.contains(call) {
            future::pending::<()>().await;
        }
        if self.failures.contains(call) {
            return Err(Error::new("Failed", call, ErrorType::Bluez));
        }
        Ok(())
    }
}

impl Adapter for MockAdapter {
    fn path(self: &Self) -> &str {
        ADAPTER_PATH
    }

    async fn is_powered(self: &Self) -> Result<bool, Error> {
        Ok(self.journal.lock().unwrap().powered)
    }

    async fn power_on(self: &Self) -> Result<(), Error> {
        self.record("power_on").await?;
        self.journal.lock().unwrap().powered = true;
        Ok(())
    }

    async fn register_agent(self: &Self, _agent: &Agent) -> Result<(), Error> {
        self.record("register_agent").await
    }

    async fn unregister_agent(self: &Self, _agent: &Agent) -> Result<(), Error> {
        self.record("unregister_agent").await
    }

    async fn register_advertisement(self: &Self, _advertisement: &Advertisement) -> Result<(), Error> {
        self.record("register_advertisement").await?;
        self.journal.lock().unwrap().advertising = true;
        Ok(())
    }

    async fn unregister_advertisement(self: &Self, _advertisement: &Advertisement) -> Result<(), Error> {
        self.record("unregister_advertisement").await?;
        self.journal.lock().unwrap().advertising = false;
        Ok(())
    }

    async fn register_application(self: &Self, _application: &Application) -> Result<(), Error> {
        self.record("register_application").await
    }

    async fn unregister_application(self: &Self, _application: &Application) -> Result<(), Error> {
        self.record("unregister_application").await
    }

    async fn notify(self: &Self, notification: &Notification) -> Result<(), Error> {
        self.record("notify").await?;
        self.journal
            .lock()
            .unwrap()
            .notifications
            .push(notification.clone());
        Ok(())
    }

    async fn release(self: Self) {
        self.journal.lock().unwrap().calls.push("release");
    }
}

/// Holds passkey requests until the test answers them.
#[derive(Default, Clone)]
pub struct DeferredPairing {
    pub pending: Arc<Mutex<Vec<PasskeyReply>>>,
    pub authorize: bool,
}

impl DeferredPairing {
    pub fn new() -> Self {
        DeferredPairing {
            pending: Arc::default(),
            authorize: true,
        }
    }
}

impl PairingHandler for DeferredPairing {
    fn on_authorization_request(self: &mut Self, _device: &Device) -> bool {
        self.authorize
    }

    fn on_passkey_request(self: &mut Self, _device: &Device, reply: PasskeyReply) {
        self.pending.lock().unwrap().push(reply);
    }

    fn abandon(self: &mut Self) {
        self.pending.lock().unwrap().clear();
    }
}

pub fn central(connection_state: ConnectionState) -> Device {
    Device::new(DEVICE_PATH, DEVICE_ADDRESS, connection_state).with_name("phone")
}
