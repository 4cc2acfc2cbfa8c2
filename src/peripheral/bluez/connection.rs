use dbus::{channel::MatchingReceiver, message::MatchRule, nonblock::SyncConnection, Path};
use dbus_crossroads::Crossroads;
use log::error;
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};
use tokio::task::JoinHandle;

use super::constants::{BLUEZ_DBUS_TIMEOUT, BLUEZ_SERVICE_NAME};
use crate::Error;

pub type Proxy<'a> = dbus::nonblock::Proxy<'a, &'a SyncConnection>;

/// The system bus connection plus the object tree every exported object
/// (advertisement, agent, GATT application) lives in.
pub struct Connection {
    pub default: Arc<SyncConnection>,
    tree: Arc<Mutex<Crossroads>>,
    resource: JoinHandle<()>,
}

impl fmt::Debug for Connection {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Connection")
    }
}

impl<'a> Connection {
    pub fn new() -> Result<Self, Error> {
        let (resource, default) = dbus_tokio::connection::new_system_sync()?;
        let resource = tokio::spawn(async move {
            let err = resource.await;
            error!("Lost connection to D-Bus: {}", err);
        });

        let mut crossroads = Crossroads::new();
        crossroads.set_async_support(Some((
            default.clone(),
            Box::new(|future| {
                tokio::spawn(future);
            }),
        )));
        let tree = Arc::new(Mutex::new(crossroads));

        {
            let tree = tree.clone();
            default.start_receive(
                MatchRule::new_method_call(),
                Box::new(move |msg, conn| {
                    if tree
                        .lock()
                        .expect("Poisoned mutex")
                        .handle_message(msg, conn)
                        .is_err()
                    {
                        error!("failed to dispatch incoming method call");
                    }
                    true
                }),
            );
        }

        Ok(Connection {
            default,
            tree,
            resource,
        })
    }

    pub fn get_bluez_proxy(self: &'a Self, path: &'a Path) -> Proxy<'a> {
        dbus::nonblock::Proxy::new(
            BLUEZ_SERVICE_NAME,
            path,
            BLUEZ_DBUS_TIMEOUT,
            &*self.default,
        )
    }

    pub fn tree(self: &Self) -> MutexGuard<'_, Crossroads> {
        self.tree.lock().expect("Poisoned mutex")
    }

    pub fn close(self: &Self) {
        self.resource.abort();
    }
}
