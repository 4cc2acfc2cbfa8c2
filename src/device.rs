use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl ConnectionState {
    pub fn name(self: &Self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnecting => "DISCONNECTING",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A remote central as last reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub path: String,
    pub address: String,
    pub name: Option<String>,
    pub connection_state: ConnectionState,
}

impl Device {
    pub fn new<P: Into<String>, A: Into<String>>(
        path: P,
        address: A,
        connection_state: ConnectionState,
    ) -> Self {
        Device {
            path: path.into(),
            address: address.into(),
            name: None,
            connection_state,
        }
    }

    pub fn with_name<T: Into<String>>(mut self: Self, name: T) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name to show in logs and prompts; falls back to the address.
    pub fn display_name(self: &Self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

impl fmt::Display for Device {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Device{{name='{}', address='{}', path='{}', state={}}}",
            self.display_name(),
            self.address,
            self.path,
            self.connection_state
        )
    }
}
