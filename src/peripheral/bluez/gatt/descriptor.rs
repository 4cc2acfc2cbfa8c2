use dbus::{arg::PropMap, MethodErr, Path};
use dbus_crossroads::{Crossroads, IfaceBuilder, IfaceToken};
use futures::channel::oneshot;

use super::{
    super::constants::{BLUEZ_ERROR_FAILED, GATT_DESCRIPTOR_IFACE},
    flags::Flags,
    forward, read_options,
};
use crate::{
    gatt::{Attribute, Descriptor, ReadRequest, WriteRequest},
    peripheral::{Event, EventSender},
};

pub struct DescriptorData {
    attribute: Attribute,
    uuid: String,
    characteristic: Path<'static>,
    flags: Vec<String>,
    events: EventSender,
}

impl DescriptorData {
    pub fn new(
        attribute: Attribute,
        descriptor: &Descriptor,
        characteristic: Path<'static>,
        events: EventSender,
    ) -> Self {
        DescriptorData {
            attribute,
            uuid: descriptor.uuid().to_string(),
            characteristic,
            flags: descriptor.properties().flags(),
            events,
        }
    }
}

pub fn register_interface(cr: &mut Crossroads) -> IfaceToken<DescriptorData> {
    cr.register(GATT_DESCRIPTOR_IFACE, |b: &mut IfaceBuilder<DescriptorData>| {
        b.method_with_cr_async(
            "ReadValue",
            ("options",),
            ("value",),
            |mut ctx, cr, (options,): (PropMap,)| {
                let (device, mtu, offset) = read_options(&options);
                let request = cr.data_mut::<DescriptorData>(ctx.path()).map(|data| {
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
                        None => Err(MethodErr::from((BLUEZ_ERROR_FAILED, "descriptor is gone"))),
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
                let request = cr.data_mut::<DescriptorData>(ctx.path()).map(|data| {
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
                        None => Err(MethodErr::from((BLUEZ_ERROR_FAILED, "descriptor is gone"))),
                    };
                    ctx.reply(result.map(|_| ()))
                }
            },
        );
        b.property::<String, _>("UUID")
            .get(|_, data| Ok(data.uuid.clone()));
        b.property::<Path<'static>, _>("Characteristic")
            .get(|_, data| Ok(data.characteristic.clone()));
        b.property::<Vec<String>, _>("Flags")
            .get(|_, data| Ok(data.flags.clone()));
    })
}
