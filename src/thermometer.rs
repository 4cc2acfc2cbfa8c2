//! The health thermometer profile served by `htsd`.
//!
//! Measurements are canned: reads of the temperature characteristic are
//! answered with a fixed record and every new subscription receives another.

use log::debug;
use uuid::Uuid;

use crate::{
    advertisement::{Advertisement, SecondaryChannel},
    config::Config,
    coordinator::Profile,
    gatt::{
        AttError, Application, NotifySubscriptionHandler, Properties, ReadHandler, ReadRequest,
        ValueStore, WriteHandler, WriteRequest,
    },
    short_uuid::sdp_short_uuid,
    Error,
};

pub const HTS_SERVICE_UUID: Uuid = sdp_short_uuid(0x1809);
pub const TEMPERATURE_CHAR_UUID: Uuid = sdp_short_uuid(0x2A1C);
pub const CUD_DESCRIPTOR_UUID: Uuid = sdp_short_uuid(0x2901);

/// Characteristic user description, NUL terminated.
pub const CUD_VALUE: &[u8] = b"hello there\0";

pub const TEMPERATURE_READ_VALUE: [u8; 13] = [
    0x06, 0x6F, 0x01, 0x00, 0xFF, 0xE6, 0x07, 0x03, 0x03, 0x10, 0x04, 0x00, 0x01,
];
pub const TEMPERATURE_NOTIFY_VALUE: [u8; 13] = [
    0x06, 0x6A, 0x01, 0x00, 0xFF, 0xE6, 0x07, 0x03, 0x03, 0x10, 0x04, 0x00, 0x01,
];

pub const TX_POWER: i16 = 5;
pub const ADVERTISING_INTERVAL: u32 = 500;

fn is_temperature(service: Uuid, characteristic: Uuid) -> bool {
    service == HTS_SERVICE_UUID && characteristic == TEMPERATURE_CHAR_UUID
}

/// Read, write and subscription handling for the temperature characteristic.
#[derive(Debug, Default, Clone, Copy)]
pub struct Thermometer;

impl ReadHandler for Thermometer {
    fn on_read_request(
        self: &mut Self,
        store: &mut ValueStore,
        request: &ReadRequest,
    ) -> Result<(), AttError> {
        let attribute = request.attribute;
        if !is_temperature(attribute.service, attribute.characteristic) {
            return Err(AttError::Rejected);
        }
        store
            .set_characteristic_value(
                attribute.service,
                attribute.characteristic,
                TEMPERATURE_READ_VALUE,
            )
            .map_err(|_| AttError::Failed)
    }
}

impl WriteHandler for Thermometer {
    fn on_write_request(
        self: &mut Self,
        _store: &ValueStore,
        _request: &WriteRequest,
    ) -> Result<(), AttError> {
        Ok(())
    }

    fn on_write_completed(self: &mut Self, _service: Uuid, characteristic: Uuid, value: &[u8]) {
        debug!(
            "characteristic <{}> updated to <{}>",
            characteristic,
            hex::encode(value)
        );
    }
}

impl NotifySubscriptionHandler for Thermometer {
    fn on_notify_subscribe(self: &mut Self, store: &mut ValueStore, service: Uuid, characteristic: Uuid) {
        debug!("on start notify");
        if !is_temperature(service, characteristic) {
            return;
        }
        if let Err(err) = store.notify(service, characteristic, TEMPERATURE_NOTIFY_VALUE) {
            debug!("initial measurement not sent: {}", err);
        }
    }

    fn on_notify_unsubscribe(
        self: &mut Self,
        _store: &mut ValueStore,
        _service: Uuid,
        _characteristic: Uuid,
    ) {
        debug!("on stop notify");
    }
}

/// Declares the health thermometer service and its advertisement.
#[derive(Debug, Default, Clone, Copy)]
pub struct HealthThermometer;

impl Profile for HealthThermometer {
    fn advertisement(self: &Self, config: &Config) -> Result<Advertisement, Error> {
        Advertisement::builder()
            .local_name(config.local_name.clone())
            .service_uuids(vec![HTS_SERVICE_UUID])
            .secondary_channel(SecondaryChannel::TwoM)
            .interval(ADVERTISING_INTERVAL, ADVERTISING_INTERVAL)
            .tx_power(TX_POWER)
            .build()
    }

    fn application(self: &Self) -> Result<Application, Error> {
        let mut application = Application::new();
        application.add_service(HTS_SERVICE_UUID)?;
        application.add_characteristic(
            HTS_SERVICE_UUID,
            TEMPERATURE_CHAR_UUID,
            Properties::INDICATE | Properties::WRITE,
        )?;
        application.add_descriptor(
            HTS_SERVICE_UUID,
            TEMPERATURE_CHAR_UUID,
            CUD_DESCRIPTOR_UUID,
            Properties::READ | Properties::WRITE,
        )?;
        application.set_descriptor_value(
            HTS_SERVICE_UUID,
            TEMPERATURE_CHAR_UUID,
            CUD_DESCRIPTOR_UUID,
            CUD_VALUE,
        )?;

        application.set_read_handler(Thermometer);
        application.set_write_handler(Thermometer);
        application.set_notify_handler(Thermometer);
        Ok(application)
    }
}
