use dbus::{
    nonblock::{stdintf::org_freedesktop_dbus::Properties, Proxy, SyncConnection},
    Path,
};
use log::debug;

use super::constants::{BLUEZ_DBUS_TIMEOUT, BLUEZ_SERVICE_NAME, DEVICE_IFACE};
use crate::device::{ConnectionState, Device};

/// Recovers `AA:BB:CC:DD:EE:FF` from a `/org/bluez/hciN/dev_AA_BB_CC_DD_EE_FF` path.
pub fn address_from_path(path: &str) -> Option<String> {
    let node = path.rsplit('/').next()?;
    let address = node.strip_prefix("dev_")?;
    Some(address.replace('_', ":"))
}

/// Looks up address and alias of the device at `path`.
///
/// A device BlueZ already dropped still yields a record built from its path.
pub async fn describe(
    connection: &SyncConnection,
    path: &Path<'static>,
    connection_state: ConnectionState,
) -> Device {
    let proxy = Proxy::new(
        BLUEZ_SERVICE_NAME,
        path.clone(),
        BLUEZ_DBUS_TIMEOUT,
        connection,
    );

    let address = match proxy.get::<String>(DEVICE_IFACE, "Address").await {
        Ok(address) => address,
        Err(err) => {
            debug!("no address for '{}': {}", path, err);
            address_from_path(path).unwrap_or_else(|| path.to_string())
        }
    };

    let device = Device::new(path.to_string(), address, connection_state);
    match proxy.get::<String>(DEVICE_IFACE, "Alias").await {
        Ok(alias) => device.with_name(alias),
        Err(_) => device,
    }
}
