use std::time::Duration;

use crate::agent::IoCapability;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
pub const DEFAULT_LOCAL_NAME: &str = "BINC";
pub const DEFAULT_AGENT_PATH: &str = "/org/bluez/BincAgent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Time after which the peripheral shuts itself down.
    pub timeout: Duration,
    /// Name carried in the advertisement.
    pub local_name: String,
    /// Object path the pairing agent is exported at.
    pub agent_path: String,
    pub io_capability: IoCapability,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timeout: DEFAULT_TIMEOUT,
            local_name: DEFAULT_LOCAL_NAME.to_owned(),
            agent_path: DEFAULT_AGENT_PATH.to_owned(),
            io_capability: IoCapability::KeyboardDisplay,
        }
    }
}
