use dbus::{
    arg::{prop_cast, PropMap},
    message::{MatchRule, SignalArgs},
    nonblock::{
        stdintf::org_freedesktop_dbus::{Properties, PropertiesPropertiesChanged},
        MsgMatch, SyncConnection,
    },
    Message, Path,
};
use dbus_crossroads::{Crossroads, IfaceToken};
use futures::{channel::mpsc::UnboundedReceiver, StreamExt};
use log::{debug, warn};
use std::{
    fmt,
    sync::{Arc, Mutex},
};
use tokio::task::JoinHandle;

use super::{
    advertisement::{self as le_advertisement, AdvertisementData},
    agent::{self as pairing_agent, AgentData},
    connection::{Connection, Proxy},
    constants::{
        ADAPTER_IFACE, AGENT_MANAGER_IFACE, BLUEZ_ROOT_PATH, BLUEZ_SERVICE_NAME, DEVICE_IFACE,
        LE_ADVERTISING_MANAGER_IFACE, PATH_BASE,
    },
    device::describe,
    gatt,
};
use crate::{
    advertisement::Advertisement,
    agent::Agent,
    device::ConnectionState,
    gatt::{Application, Notification},
    peripheral::{Adapter, Event, EventSender},
    Error, ErrorType,
};

enum Change {
    Powered(bool),
    Connected(bool),
}

fn read_change(message: &Message) -> Option<Change> {
    let (interface, changed): (String, PropMap) = message.read2().ok()?;
    match interface.as_str() {
        ADAPTER_IFACE => prop_cast::<bool>(&changed, "Powered")
            .copied()
            .map(Change::Powered),
        DEVICE_IFACE => prop_cast::<bool>(&changed, "Connected")
            .copied()
            .map(Change::Connected),
        _ => None,
    }
}

/// Turns property changes under the adapter into events, one at a time, so
/// connection changes reach the coordinator in the order BlueZ sent them.
async fn forward_changes(
    connection: Arc<SyncConnection>,
    mut messages: UnboundedReceiver<Message>,
    events: EventSender,
) {
    while let Some(message) = messages.next().await {
        let path = match message.path() {
            Some(path) => path.into_static(),
            None => continue,
        };
        let event = match read_change(&message) {
            Some(Change::Powered(powered)) => Event::PoweredChanged {
                adapter: path.to_string(),
                powered,
            },
            Some(Change::Connected(connected)) => {
                let state = if connected {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Disconnected
                };
                Event::CentralStateChanged(describe(&connection, &path, state).await)
            }
            None => continue,
        };
        if events.unbounded_send(event).is_err() {
            debug!("event receiver closed, no longer forwarding changes");
            break;
        }
    }
}

fn object_path(path: &str) -> Result<Path<'static>, Error> {
    Path::new(path.to_owned())
        .map_err(|err| Error::new("InvalidObjectPath", err, ErrorType::Bluez))
}

/// Removes the object at `path` from the tree unless BlueZ still holds it.
fn retain_exported<D: Send + 'static>(cr: &mut Crossroads, path: &Path<'static>, held: bool) {
    if !held {
        cr.remove::<D>(path);
    }
}

async fn register_default_agent(
    proxy: &Proxy<'_>,
    path: &Path<'static>,
    capability: &str,
) -> Result<(), dbus::Error> {
    let _: () = proxy
        .method_call(AGENT_MANAGER_IFACE, "RegisterAgent", (path, capability))
        .await?;
    let result: Result<(), dbus::Error> = proxy
        .method_call(AGENT_MANAGER_IFACE, "RequestDefaultAgent", (path,))
        .await;
    if result.is_err() {
        let undone: Result<(), dbus::Error> = proxy
            .method_call(AGENT_MANAGER_IFACE, "UnregisterAgent", (path,))
            .await;
        if let Err(err) = undone {
            warn!("failed to unregister agent '{}': {}", path, err);
        }
    }
    result
}

pub struct BluezAdapter {
    connection: Arc<Connection>,
    object_path: Path<'static>,
    events: EventSender,
    signals: MsgMatch,
    forwarder: JoinHandle<()>,
    advertisement_iface: Mutex<Option<IfaceToken<AdvertisementData>>>,
    application: Mutex<Option<gatt::Registration>>,
}

impl fmt::Debug for BluezAdapter {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BluezAdapter({})", self.object_path)
    }
}

impl BluezAdapter {
    pub async fn new(
        connection: Arc<Connection>,
        object_path: Path<'static>,
        events: EventSender,
    ) -> Result<Self, Error> {
        let mut rule = MatchRule::new_signal(
            PropertiesPropertiesChanged::INTERFACE,
            PropertiesPropertiesChanged::NAME,
        );
        rule.sender = Some(BLUEZ_SERVICE_NAME.into());
        rule.path = Some(object_path.clone());
        rule.path_is_namespace = true;

        let (signals, messages) = connection.default.add_match(rule).await?.msg_stream();
        let forwarder = tokio::spawn(forward_changes(
            connection.default.clone(),
            messages,
            events.clone(),
        ));

        Ok(BluezAdapter {
            connection,
            object_path,
            events,
            signals,
            forwarder,
            advertisement_iface: Mutex::new(None),
            application: Mutex::new(None),
        })
    }

    fn advertisement_path() -> Path<'static> {
        format!("{}/advertisement{:04}", PATH_BASE, 0).into()
    }
}

impl Adapter for BluezAdapter {
    fn path(self: &Self) -> &str {
        &self.object_path
    }

    async fn is_powered(self: &Self) -> Result<bool, Error> {
        let proxy = self.connection.get_bluez_proxy(&self.object_path);
        let powered: bool = proxy.get(ADAPTER_IFACE, "Powered").await?;
        Ok(powered)
    }

    async fn power_on(self: &Self) -> Result<(), Error> {
        let proxy = self.connection.get_bluez_proxy(&self.object_path);
        proxy.set(ADAPTER_IFACE, "Powered", true).await?;
        Ok(())
    }

    async fn register_agent(self: &Self, agent: &Agent) -> Result<(), Error> {
        let path = object_path(agent.path())?;
        {
            let mut tree = self.connection.tree();
            let token = pairing_agent::register_interface(&mut tree);
            tree.insert(
                path.clone(),
                &[token],
                AgentData::new(self.connection.default.clone(), self.events.clone()),
            );
        }

        let root = Path::from(BLUEZ_ROOT_PATH);
        let proxy = self.connection.get_bluez_proxy(&root);
        let result = register_default_agent(&proxy, &path, agent.capability().as_str()).await;
        retain_exported::<AgentData>(&mut self.connection.tree(), &path, result.is_ok());
        result.map_err(Error::from)
    }

    async fn unregister_agent(self: &Self, agent: &Agent) -> Result<(), Error> {
        let path = object_path(agent.path())?;
        let root = Path::from(BLUEZ_ROOT_PATH);
        let proxy = self.connection.get_bluez_proxy(&root);
        let result: Result<(), dbus::Error> = proxy
            .method_call(AGENT_MANAGER_IFACE, "UnregisterAgent", (&path,))
            .await;
        self.connection.tree().remove::<AgentData>(&path);
        result.map_err(Error::from)
    }

    async fn register_advertisement(self: &Self, advertisement: &Advertisement) -> Result<(), Error> {
        let path = BluezAdapter::advertisement_path();
        {
            let mut tree = self.connection.tree();
            let mut iface = self.advertisement_iface.lock().expect("Poisoned mutex");
            let token = *iface
                .get_or_insert_with(|| le_advertisement::register_interface(&mut tree, advertisement));
            tree.insert(path.clone(), &[token], AdvertisementData::from(advertisement));
        }

        let proxy = self.connection.get_bluez_proxy(&self.object_path);
        let result: Result<(), dbus::Error> = proxy
            .method_call(
                LE_ADVERTISING_MANAGER_IFACE,
                "RegisterAdvertisement",
                (&path, PropMap::new()),
            )
            .await;
        retain_exported::<AdvertisementData>(&mut self.connection.tree(), &path, result.is_ok());
        result.map_err(Error::from)
    }

    async fn unregister_advertisement(self: &Self, _advertisement: &Advertisement) -> Result<(), Error> {
        let path = BluezAdapter::advertisement_path();
        let proxy = self.connection.get_bluez_proxy(&self.object_path);
        let result: Result<(), dbus::Error> = proxy
            .method_call(
                LE_ADVERTISING_MANAGER_IFACE,
                "UnregisterAdvertisement",
                (&path,),
            )
            .await;
        retain_exported::<AdvertisementData>(&mut self.connection.tree(), &path, result.is_err());
        result.map_err(Error::from)
    }

    async fn register_application(self: &Self, application: &Application) -> Result<(), Error> {
        let registration = {
            let mut tree = self.connection.tree();
            gatt::export(&mut tree, application, &self.events)
        };
        let path = registration.object_path.clone();
        self.application
            .lock()
            .expect("Poisoned mutex")
            .replace(registration);

        if let Err(err) = gatt::register(&self.connection, &self.object_path, &path).await {
            if let Some(registration) = self.application.lock().expect("Poisoned mutex").take() {
                registration.remove(&mut self.connection.tree());
            }
            return Err(err);
        }
        Ok(())
    }

    async fn unregister_application(self: &Self, _application: &Application) -> Result<(), Error> {
        let registration = self.application.lock().expect("Poisoned mutex").take();
        let registration = match registration {
            Some(registration) => registration,
            None => return Ok(()),
        };
        let result =
            gatt::unregister(&self.connection, &self.object_path, &registration.object_path).await;
        registration.remove(&mut self.connection.tree());
        result
    }

    async fn notify(self: &Self, notification: &Notification) -> Result<(), Error> {
        let path = self
            .application
            .lock()
            .expect("Poisoned mutex")
            .as_ref()
            .and_then(|registration| {
                registration.characteristic_path(notification.service, notification.characteristic)
            })
            .cloned();
        let path = path.ok_or_else(|| {
            Error::new(
                "UnknownCharacteristic",
                format!("<{}> is not exported", notification.characteristic),
                ErrorType::Gatt,
            )
        })?;
        gatt::notify(&self.connection, &path, &notification.value)
    }

    async fn release(self: Self) {
        self.forwarder.abort();
        if let Err(err) = self.connection.default.remove_match(self.signals.token()).await {
            warn!("failed to remove signal match on '{}': {}", self.object_path, err);
        }
        if let Some(registration) = self.application.lock().expect("Poisoned mutex").take() {
            registration.remove(&mut self.connection.tree());
        }
        debug!("released adapter '{}'", self.object_path);
    }
}

#[cfg(test)]
mod tests {
    use super::retain_exported;
    use dbus::Path;
    use dbus_crossroads::{Crossroads, IfaceToken};

    fn exported() -> (Crossroads, Path<'static>) {
        let mut cr = Crossroads::new();
        let path: Path<'static> = "/org/bluez/htsd/advertisement0000".into();
        cr.insert(path.clone(), &[] as &[IfaceToken<u8>], 7u8);
        (cr, path)
    }

    #[test]
    fn drops_object_bluez_refused() {
        let (mut cr, path) = exported();
        retain_exported::<u8>(&mut cr, &path, false);
        assert!(cr.data_mut::<u8>(&path).is_none());
    }

    #[test]
    fn keeps_object_bluez_still_holds() {
        let (mut cr, path) = exported();
        retain_exported::<u8>(&mut cr, &path, true);
        assert_eq!(cr.data_mut::<u8>(&path), Some(&mut 7));
    }
}
