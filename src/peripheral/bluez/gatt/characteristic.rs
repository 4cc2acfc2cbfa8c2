use dbus::{arg::PropMap, MethodErr, Path};
use dbus_crossroads::{Crossroads, IfaceBuilder, IfaceToken};
use futures::channel::oneshot;
use log::debug;
use uuid::Uuid;

use super::{
    super::constants::{BLUEZ_ERROR_FAILED, GATT_CHARACTERISTIC_IFACE},
    flags::Flags,
    forward, read_options,
};
use crate::{
    gatt::{Attribute, Characteristic, ReadRequest, WriteRequest},
    peripheral::{Event, EventSender},
};

pub struct CharacteristicData {
    attribute: Attribute,
    uuid: String,
    service: Path<'static>,
    flags: Vec<String>,
    notifying: bool,
    events: EventSender,
}

impl CharacteristicData {
    pub fn new(
        service_uuid: Uuid,
        characteristic: &Characteristic,
        service: Path<'static>,
        events: EventSender,
    ) -> Self {
        CharacteristicData {
            attribute: Attribute::characteristic(service_uuid, characteristic.uuid()),
            uuid: characteristic.uuid().to_string(),
            service,
            flags: characteristic.properties().flags(),
            notifying: false,
            events,
        }
    }
}

fn unavailable() -> MethodErr {
    MethodErr::from((BLUEZ_ERROR_FAILED, "characteristic is gone"))
}

pub fn register_interface(cr: &mut Crossroads) -> IfaceToken<CharacteristicData> {
    cr.register(
        GATT_CHARACTERISTIC_IFACE,
        |b: &mut IfaceBuilder<CharacteristicData>| {
            b.method_with_cr_async(
                "ReadValue",
                ("options",),
                ("value",),
                |mut ctx, cr, (options,): (PropMap,)| {
                    let (device, mtu, offset) = read_options(&options);
                    let request = cr
                        .data_mut::<CharacteristicData>(ctx.path())
                        .map(|data| {
                            let (response, receiver) = oneshot::channel();
                            let request = ReadRequest {
                                attribute: data.attribute,
                                device,
                                mtu,
                                offset,
                            };
                            (data.events.clone(), Event::Read { request, response }, receiver)
                        });
                    async move {
                        let result = match request {
                            Some((events, event, receiver)) => forward(events, event, receiver).await,
                            None => Err(unavailable()),
                        };
                        ctx.reply(result.map(|value| (value,)))
                    }
                },
            );
            b.method_with_cr_async(
                "WriteValue",
                ("value", "options"),
                (),
                |mut ctx, cr, (value, options): (Vec<u8>, PropMap)| {
                    let (device, mtu, offset) = read_options(&options);
                    let request = cr
                        .data_mut::<CharacteristicData>(ctx.path())
                        .map(|data| {
                            let (response, receiver) = oneshot::channel();
                            let request = WriteRequest {
                                attribute: data.attribute,
                                device,
                                value,
                                mtu,
                                offset,
                            };
                            (data.events.clone(), Event::Write { request, response }, receiver)
                        });
                    async move {
                        let result = match request {
                            Some((events, event, receiver)) => forward(events, event, receiver).await,
                            None => Err(unavailable()),
                        };
                        ctx.reply(result.map(|_| ()))
                    }
                },
            );
            b.method("StartNotify", (), (), |_, data, ()| {
                if data.notifying {
                    debug!("already notifying <{}>", data.uuid);
                    return Ok(());
                }
                data.notifying = true;
                data.events
                    .unbounded_send(Event::NotifySubscribe(data.attribute))
                    .map_err(|_| unavailable())
            });
            b.method("StopNotify", (), (), |_, data, ()| {
                if !data.notifying {
                    return Ok(());
                }
                data.notifying = false;
                data.events
                    .unbounded_send(Event::NotifyUnsubscribe(data.attribute))
                    .map_err(|_| unavailable())
            });
            b.property::<String, _>("UUID")
                .get(|_, data| Ok(data.uuid.clone()));
            b.property::<Path<'static>, _>("Service")
                .get(|_, data| Ok(data.service.clone()));
            b.property::<Vec<String>, _>("Flags")
                .get(|_, data| Ok(data.flags.clone()));
            b.property::<bool, _>("Notifying")
                .get(|_, data| Ok(data.notifying));
        },
    )
}
