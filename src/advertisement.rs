use std::{collections::BTreeMap, fmt, str::FromStr};
use uuid::Uuid;

use crate::{Error, ErrorType};

/// PHY used for the secondary advertising channel (extended advertising).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryChannel {
    OneM,
    TwoM,
    Coded,
}

impl SecondaryChannel {
    pub fn as_str(self: &Self) -> &'static str {
        match self {
            SecondaryChannel::OneM => "1M",
            SecondaryChannel::TwoM => "2M",
            SecondaryChannel::Coded => "Coded",
        }
    }
}

impl fmt::Display for SecondaryChannel {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecondaryChannel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1M" => Ok(SecondaryChannel::OneM),
            "2M" => Ok(SecondaryChannel::TwoM),
            "Coded" => Ok(SecondaryChannel::Coded),
            other => Err(Error::new(
                "InvalidSecondaryChannel",
                format!("unknown secondary channel {:?}", other),
                ErrorType::Advertisement,
            )),
        }
    }
}

/// What to broadcast while no central is connected.
///
/// Pure configuration: the registration with the controller is tracked by
/// the adapter side, never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advertisement {
    local_name: Option<String>,
    service_uuids: Vec<Uuid>,
    tx_power: Option<i16>,
    interval: Option<(u32, u32)>,
    secondary_channel: Option<SecondaryChannel>,
    manufacturer_data: BTreeMap<u16, Vec<u8>>,
    service_data: BTreeMap<Uuid, Vec<u8>>,
}

impl Advertisement {
    pub fn builder() -> AdvertisementBuilder {
        AdvertisementBuilder::default()
    }

    pub fn local_name(self: &Self) -> Option<&str> {
        self.local_name.as_deref()
    }

    pub fn service_uuids(self: &Self) -> &[Uuid] {
        &self.service_uuids
    }

    /// Requested transmit power in dBm.
    pub fn tx_power(self: &Self) -> Option<i16> {
        self.tx_power
    }

    /// Advertising interval bounds `(min, max)` in milliseconds.
    pub fn interval(self: &Self) -> Option<(u32, u32)> {
        self.interval
    }

    pub fn secondary_channel(self: &Self) -> Option<SecondaryChannel> {
        self.secondary_channel
    }

    pub fn manufacturer_data(self: &Self) -> &BTreeMap<u16, Vec<u8>> {
        &self.manufacturer_data
    }

    pub fn service_data(self: &Self) -> &BTreeMap<Uuid, Vec<u8>> {
        &self.service_data
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdvertisementBuilder {
    local_name: Option<String>,
    service_uuids: Vec<Uuid>,
    tx_power: Option<i16>,
    interval: Option<(u32, u32)>,
    secondary_channel: Option<SecondaryChannel>,
    manufacturer_data: BTreeMap<u16, Vec<u8>>,
    service_data: BTreeMap<Uuid, Vec<u8>>,
}

impl AdvertisementBuilder {
    pub fn local_name<T: Into<String>>(mut self: Self, name: T) -> Self {
        self.local_name = Some(name.into());
        self
    }

    pub fn service_uuids<T: Into<Vec<Uuid>>>(mut self: Self, uuids: T) -> Self {
        self.service_uuids = uuids.into();
        self
    }

    pub fn tx_power(mut self: Self, dbm: i16) -> Self {
        self.tx_power = Some(dbm);
        self
    }

    pub fn interval(mut self: Self, min: u32, max: u32) -> Self {
        self.interval = Some((min, max));
        self
    }

    pub fn secondary_channel(mut self: Self, channel: SecondaryChannel) -> Self {
        self.secondary_channel = Some(channel);
        self
    }

    pub fn manufacturer_data<T: Into<Vec<u8>>>(mut self: Self, company: u16, data: T) -> Self {
        self.manufacturer_data.insert(company, data.into());
        self
    }

    pub fn service_data<T: Into<Vec<u8>>>(mut self: Self, service: Uuid, data: T) -> Self {
        self.service_data.insert(service, data.into());
        self
    }

    pub fn build(self: Self) -> Result<Advertisement, Error> {
        if let Some((min, max)) = self.interval {
            if min > max {
                return Err(Error::new(
                    "InvalidInterval",
                    format!("minimum interval {} exceeds maximum {}", min, max),
                    ErrorType::Advertisement,
                ));
            }
        }
        if let Some(name) = &self.local_name {
            if name.is_empty() {
                return Err(Error::new(
                    "InvalidLocalName",
                    "local name must not be empty",
                    ErrorType::Advertisement,
                ));
            }
        }

        Ok(Advertisement {
            local_name: self.local_name,
            service_uuids: self.service_uuids,
            tx_power: self.tx_power,
            interval: self.interval,
            secondary_channel: self.secondary_channel,
            manufacturer_data: self.manufacturer_data,
            service_data: self.service_data,
        })
    }
}
