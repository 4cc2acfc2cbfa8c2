use dbus::{nonblock::SyncConnection, MethodErr, Path};
use dbus_crossroads::{Crossroads, IfaceBuilder, IfaceToken};
use futures::channel::oneshot;
use log::{debug, info};
use std::sync::Arc;

use super::{
    constants::{AGENT_IFACE, BLUEZ_ERROR_CANCELED, BLUEZ_ERROR_REJECTED},
    device::describe,
};
use crate::{
    agent::PasskeyReply,
    device::ConnectionState,
    peripheral::{Event, EventSender},
};

/// Data behind an exported `org.bluez.Agent1` object.
pub struct AgentData {
    connection: Arc<SyncConnection>,
    events: EventSender,
}

impl AgentData {
    pub fn new(connection: Arc<SyncConnection>, events: EventSender) -> Self {
        AgentData { connection, events }
    }
}

fn shutting_down() -> MethodErr {
    MethodErr::from((BLUEZ_ERROR_REJECTED, "peripheral is shutting down"))
}

async fn authorize(
    connection: Arc<SyncConnection>,
    events: EventSender,
    device: Path<'static>,
) -> Result<(), MethodErr> {
    let device = describe(&connection, &device, ConnectionState::Connected).await;
    let (response, receiver) = oneshot::channel();
    events
        .unbounded_send(Event::AuthorizationRequest { device, response })
        .map_err(|_| shutting_down())?;

    match receiver.await {
        Ok(true) => Ok(()),
        Ok(false) => Err(MethodErr::from((BLUEZ_ERROR_REJECTED, "pairing rejected"))),
        Err(_) => Err(MethodErr::from((BLUEZ_ERROR_CANCELED, "pairing abandoned"))),
    }
}

async fn request_passkey(
    connection: Arc<SyncConnection>,
    events: EventSender,
    device: Path<'static>,
) -> Result<u32, MethodErr> {
    let device = describe(&connection, &device, ConnectionState::Connected).await;
    let (reply, receiver) = PasskeyReply::channel();
    events
        .unbounded_send(Event::PasskeyRequest { device, reply })
        .map_err(|_| shutting_down())?;

    receiver
        .await
        .map_err(|_| MethodErr::from((BLUEZ_ERROR_CANCELED, "passkey entry abandoned")))
}

fn context(cr: &mut Crossroads, path: &Path<'static>) -> Option<(Arc<SyncConnection>, EventSender)> {
    cr.data_mut::<AgentData>(path)
        .map(|data| (data.connection.clone(), data.events.clone()))
}

pub fn register_interface(cr: &mut Crossroads) -> IfaceToken<AgentData> {
    cr.register(AGENT_IFACE, |b: &mut IfaceBuilder<AgentData>| {
        b.method("Release", (), (), |_, _, ()| {
            debug!("agent released");
            Ok(())
        });
        b.method("Cancel", (), (), |_, _, ()| {
            info!("pairing cancelled by the remote side");
            Ok(())
        });
        b.method(
            "DisplayPasskey",
            ("device", "passkey", "entered"),
            (),
            |_, _, (device, passkey, entered): (Path<'static>, u32, u16)| {
                info!("passkey for '{}' is {:06} ({} entered)", device, passkey, entered);
                Ok(())
            },
        );
        b.method(
            "DisplayPinCode",
            ("device", "pincode"),
            (),
            |_, _, (device, pincode): (Path<'static>, String)| {
                info!("pin code for '{}' is {}", device, pincode);
                Ok(())
            },
        );
        b.method_with_cr_async(
            "RequestAuthorization",
            ("device",),
            (),
            |mut ctx, cr, (device,): (Path<'static>,)| {
                let target = context(cr, ctx.path());
                async move {
                    let result = match target {
                        Some((connection, events)) => authorize(connection, events, device).await,
                        None => Err(shutting_down()),
                    };
                    ctx.reply(result)
                }
            },
        );
        b.method_with_cr_async(
            "AuthorizeService",
            ("device", "uuid"),
            (),
            |mut ctx, cr, (device, uuid): (Path<'static>, String)| {
                debug!("authorizing service <{}> for '{}'", uuid, device);
                let target = context(cr, ctx.path());
                async move {
                    let result = match target {
                        Some((connection, events)) => authorize(connection, events, device).await,
                        None => Err(shutting_down()),
                    };
                    ctx.reply(result)
                }
            },
        );
        b.method_with_cr_async(
            "RequestConfirmation",
            ("device", "passkey"),
            (),
            |mut ctx, cr, (device, passkey): (Path<'static>, u32)| {
                info!("confirming passkey {:06} for '{}'", passkey, device);
                let target = context(cr, ctx.path());
                async move {
                    let result = match target {
                        Some((connection, events)) => authorize(connection, events, device).await,
                        None => Err(shutting_down()),
                    };
                    ctx.reply(result)
                }
            },
        );
        b.method_with_cr_async(
            "RequestPasskey",
            ("device",),
            ("passkey",),
            |mut ctx, cr, (device,): (Path<'static>,)| {
                let target = context(cr, ctx.path());
                async move {
                    let result = match target {
                        Some((connection, events)) => {
                            request_passkey(connection, events, device).await
                        }
                        None => Err(shutting_down()),
                    };
                    ctx.reply(result.map(|passkey| (passkey,)))
                }
            },
        );
        b.method_with_cr_async(
            "RequestPinCode",
            ("device",),
            ("pincode",),
            |mut ctx, cr, (device,): (Path<'static>,)| {
                let target = context(cr, ctx.path());
                async move {
                    let result = match target {
                        Some((connection, events)) => {
                            request_passkey(connection, events, device).await
                        }
                        None => Err(shutting_down()),
                    };
                    ctx.reply(result.map(|passkey| (format!("{:06}", passkey),)))
                }
            },
        );
    })
}
