use dbus::arg::Variant;
use dbus_crossroads::{Crossroads, IfaceBuilder, IfaceToken};
use log::debug;
use std::collections::HashMap;

use super::constants::LE_ADVERTISEMENT_IFACE;
use crate::advertisement::Advertisement;

const ADVERTISEMENT_TYPE: &str = "peripheral";

/// Properties of the exported `org.bluez.LEAdvertisement1` object, flattened
/// into the shapes BlueZ reads.
pub struct AdvertisementData {
    local_name: Option<String>,
    service_uuids: Vec<String>,
    tx_power: Option<i16>,
    interval: Option<(u32, u32)>,
    secondary_channel: Option<String>,
    manufacturer_data: HashMap<u16, Variant<Vec<u8>>>,
    service_data: HashMap<String, Variant<Vec<u8>>>,
}

impl From<&Advertisement> for AdvertisementData {
    fn from(advertisement: &Advertisement) -> Self {
        AdvertisementData {
            local_name: advertisement.local_name().map(str::to_owned),
            service_uuids: advertisement
                .service_uuids()
                .iter()
                .map(|uuid| uuid.to_string())
                .collect(),
            tx_power: advertisement.tx_power(),
            interval: advertisement.interval(),
            secondary_channel: advertisement
                .secondary_channel()
                .map(|channel| channel.as_str().to_owned()),
            manufacturer_data: advertisement
                .manufacturer_data()
                .iter()
                .map(|(company, data)| (*company, Variant(data.clone())))
                .collect(),
            service_data: advertisement
                .service_data()
                .iter()
                .map(|(uuid, data)| (uuid.to_string(), Variant(data.clone())))
                .collect(),
        }
    }
}

/// Registers the advertisement interface. Optional properties are only
/// published when `advertisement` sets them, so the token must be reused
/// for this advertisement alone.
pub fn register_interface(
    cr: &mut Crossroads,
    advertisement: &Advertisement,
) -> IfaceToken<AdvertisementData> {
    let has_name = advertisement.local_name().is_some();
    let has_tx_power = advertisement.tx_power().is_some();
    let has_interval = advertisement.interval().is_some();
    let has_secondary_channel = advertisement.secondary_channel().is_some();
    let has_manufacturer_data = !advertisement.manufacturer_data().is_empty();
    let has_service_data = !advertisement.service_data().is_empty();

    cr.register(
        LE_ADVERTISEMENT_IFACE,
        |b: &mut IfaceBuilder<AdvertisementData>| {
            b.method("Release", (), (), |_, _, ()| {
                debug!("advertisement released");
                Ok(())
            });
            b.property::<String, _>("Type")
                .get(|_, _| Ok(ADVERTISEMENT_TYPE.to_owned()));
            b.property::<Vec<String>, _>("ServiceUUIDs")
                .get(|_, data| Ok(data.service_uuids.clone()));
            if has_name {
                b.property::<String, _>("LocalName")
                    .get(|_, data| Ok(data.local_name.clone().unwrap_or_default()));
            }
            if has_tx_power {
                b.property::<i16, _>("TxPower")
                    .get(|_, data| Ok(data.tx_power.unwrap_or_default()));
                b.property::<Vec<String>, _>("Includes")
                    .get(|_, _| Ok(vec!["tx-power".to_owned()]));
            }
            if has_interval {
                b.property::<u32, _>("MinInterval")
                    .get(|_, data| Ok(data.interval.map(|(min, _)| min).unwrap_or_default()));
                b.property::<u32, _>("MaxInterval")
                    .get(|_, data| Ok(data.interval.map(|(_, max)| max).unwrap_or_default()));
            }
            if has_secondary_channel {
                b.property::<String, _>("SecondaryChannel")
                    .get(|_, data| Ok(data.secondary_channel.clone().unwrap_or_default()));
            }
            if has_manufacturer_data {
                b.property::<HashMap<u16, Variant<Vec<u8>>>, _>("ManufacturerData")
                    .get(|_, data| Ok(data.manufacturer_data.clone()));
            }
            if has_service_data {
                b.property::<HashMap<String, Variant<Vec<u8>>>, _>("ServiceData")
                    .get(|_, data| Ok(data.service_data.clone()));
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::AdvertisementData;
    use crate::{
        advertisement::{Advertisement, SecondaryChannel},
        short_uuid::sdp_short_uuid,
    };

    #[test]
    fn flattens_advertisement() {
        let advertisement = Advertisement::builder()
            .local_name("BINC")
            .service_uuids(vec![sdp_short_uuid(0x1809)])
            .secondary_channel(SecondaryChannel::TwoM)
            .manufacturer_data(0x0059, vec![0x01, 0x02])
            .build()
            .unwrap();
        let data = AdvertisementData::from(&advertisement);
        assert_eq!(data.local_name.as_deref(), Some("BINC"));
        assert_eq!(
            data.service_uuids,
            vec!["00001809-0000-1000-8000-00805f9b34fb".to_owned()]
        );
        assert_eq!(data.secondary_channel.as_deref(), Some("2M"));
        assert_eq!(data.manufacturer_data[&0x0059].0, vec![0x01, 0x02]);
    }
}
