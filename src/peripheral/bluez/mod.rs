//! BlueZ backend, talking to `bluetoothd` over the system D-Bus.

mod adapter;
mod advertisement;
mod agent;
mod connection;
mod constants;
mod device;
mod error;
mod gatt;

use dbus::{nonblock::stdintf::org_freedesktop_dbus::ObjectManager, Path};
use log::debug;
use std::sync::{Arc, Mutex};

pub use self::adapter::BluezAdapter;
use self::{
    connection::Connection,
    constants::{GATT_MANAGER_IFACE, LE_ADVERTISING_MANAGER_IFACE},
};
use super::{EventSender, Transport};
use crate::Error;

/// Lazily connects to the system bus on first use.
#[derive(Debug, Default)]
pub struct BluezTransport {
    connection: Mutex<Option<Arc<Connection>>>,
}

impl BluezTransport {
    pub fn new() -> Self {
        BluezTransport::default()
    }

    fn connection(self: &Self) -> Result<Arc<Connection>, Error> {
        let mut connection = self.connection.lock().expect("Poisoned mutex");
        if let Some(connection) = connection.as_ref() {
            return Ok(connection.clone());
        }
        let new_connection = Arc::new(Connection::new()?);
        connection.replace(new_connection.clone());
        Ok(new_connection)
    }
}

/// The adapter with the lowest object path among those offering both GATT
/// and LE advertising managers.
async fn find_adapter(connection: &Connection) -> Result<Option<Path<'static>>, Error> {
    let root = Path::from("/");
    let proxy = connection.get_bluez_proxy(&root);
    let managed_objects = proxy.get_managed_objects().await?;

    let mut adapters: Vec<Path<'static>> = managed_objects
        .into_iter()
        .filter(|(_, interfaces)| {
            interfaces.contains_key(GATT_MANAGER_IFACE)
                && interfaces.contains_key(LE_ADVERTISING_MANAGER_IFACE)
        })
        .map(|(path, _)| path)
        .collect();
    adapters.sort_by_key(|path| path.to_string());
    Ok(adapters.into_iter().next())
}

impl Transport for BluezTransport {
    type Adapter = BluezAdapter;

    async fn default_adapter(self: &Self, events: EventSender) -> Result<Option<BluezAdapter>, Error> {
        let connection = self.connection()?;
        let object_path = match find_adapter(&connection).await? {
            Some(object_path) => object_path,
            None => return Ok(None),
        };
        BluezAdapter::new(connection, object_path, events)
            .await
            .map(Some)
    }

    async fn close(self: &Self) {
        if let Some(connection) = self.connection.lock().expect("Poisoned mutex").take() {
            connection.close();
            debug!("closed system bus connection");
        }
    }
}
