use std::time::Duration;

pub const BLUEZ_SERVICE_NAME: &str = "org.bluez";
pub const BLUEZ_ROOT_PATH: &str = "/org/bluez";

pub const ADAPTER_IFACE: &str = "org.bluez.Adapter1";
pub const DEVICE_IFACE: &str = "org.bluez.Device1";

pub const AGENT_IFACE: &str = "org.bluez.Agent1";
pub const AGENT_MANAGER_IFACE: &str = "org.bluez.AgentManager1";

pub const LE_ADVERTISING_MANAGER_IFACE: &str = "org.bluez.LEAdvertisingManager1";
pub const LE_ADVERTISEMENT_IFACE: &str = "org.bluez.LEAdvertisement1";

pub const GATT_SERVICE_IFACE: &str = "org.bluez.GattService1";
pub const GATT_CHARACTERISTIC_IFACE: &str = "org.bluez.GattCharacteristic1";
pub const GATT_DESCRIPTOR_IFACE: &str = "org.bluez.GattDescriptor1";
pub const GATT_MANAGER_IFACE: &str = "org.bluez.GattManager1";

pub const BLUEZ_ERROR_FAILED: &str = "org.bluez.Error.Failed";
pub const BLUEZ_ERROR_REJECTED: &str = "org.bluez.Error.Rejected";
pub const BLUEZ_ERROR_CANCELED: &str = "org.bluez.Error.Canceled";
pub const BLUEZ_ERROR_NOTPERMITTED: &str = "org.bluez.Error.NotPermitted";
pub const BLUEZ_ERROR_INVALIDOFFSET: &str = "org.bluez.Error.InvalidOffset";
pub const BLUEZ_ERROR_NOTSUPPORTED: &str = "org.bluez.Error.NotSupported";

pub const PATH_BASE: &str = "/org/bluez/htsd";

pub const BLUEZ_DBUS_TIMEOUT: Duration = Duration::from_secs(30);
