use dbus::{Error as DbusError, MethodErr};

use super::constants::{
    BLUEZ_ERROR_FAILED, BLUEZ_ERROR_INVALIDOFFSET, BLUEZ_ERROR_NOTPERMITTED,
    BLUEZ_ERROR_NOTSUPPORTED, BLUEZ_ERROR_REJECTED,
};
use crate::{gatt::AttError, Error, ErrorType};

impl From<DbusError> for Error {
    fn from(dbus_error: DbusError) -> Error {
        Error::new(
            dbus_error.name().unwrap_or(""),
            dbus_error.message().unwrap_or(""),
            ErrorType::Bluez,
        )
    }
}

pub fn att_error_name(att_error: AttError) -> &'static str {
    match att_error {
        AttError::Rejected => BLUEZ_ERROR_REJECTED,
        AttError::NotPermitted => BLUEZ_ERROR_NOTPERMITTED,
        AttError::InvalidOffset => BLUEZ_ERROR_INVALIDOFFSET,
        AttError::NotSupported => BLUEZ_ERROR_NOTSUPPORTED,
        AttError::Failed => BLUEZ_ERROR_FAILED,
    }
}

impl From<AttError> for MethodErr {
    fn from(att_error: AttError) -> MethodErr {
        MethodErr::from((att_error_name(att_error), att_error.to_string()))
    }
}
