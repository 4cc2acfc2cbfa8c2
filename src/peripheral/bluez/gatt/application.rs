use dbus::{arg::PropMap, Path};

use super::super::{connection::Connection, constants::GATT_MANAGER_IFACE};
use crate::Error;

pub async fn register(
    connection: &Connection,
    adapter: &Path<'static>,
    application: &Path<'static>,
) -> Result<(), Error> {
    let proxy = connection.get_bluez_proxy(adapter);
    let _: () = proxy
        .method_call(
            GATT_MANAGER_IFACE,
            "RegisterApplication",
            (application, PropMap::new()),
        )
        .await?;
    Ok(())
}

pub async fn unregister(
    connection: &Connection,
    adapter: &Path<'static>,
    application: &Path<'static>,
) -> Result<(), Error> {
    let proxy = connection.get_bluez_proxy(adapter);
    let _: () = proxy
        .method_call(GATT_MANAGER_IFACE, "UnregisterApplication", (application,))
        .await?;
    Ok(())
}
