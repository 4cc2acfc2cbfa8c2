use uuid::Uuid;

const BASE_UUID: (u16, u16, &[u8; 8]) = (0, 0x1000, b"\x80\x00\x00\x80\x5F\x9B\x34\xFB");

/// Expands a 16 or 32 bit SIG-assigned number onto the Bluetooth base UUID.
pub const fn sdp_short_uuid(short: u32) -> Uuid {
    Uuid::from_fields(short, BASE_UUID.0, BASE_UUID.1, BASE_UUID.2)
}

pub trait SdpShortUuid<T: Into<u32>> {
    fn from_sdp_short_uuid(uuid: T) -> Uuid {
        sdp_short_uuid(uuid.into())
    }
}

impl SdpShortUuid<u16> for Uuid {}
impl SdpShortUuid<u32> for Uuid {}
