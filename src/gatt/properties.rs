use bitflags::bitflags;

bitflags! {
    /// Characteristic and descriptor property flags.
    ///
    /// The low byte mirrors the characteristic properties field of the
    /// characteristic declaration; the high bits are the extended and
    /// security requirements BlueZ accepts in its `Flags` property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Properties: u16 {
        const BROADCAST = 0x0001;
        const READ = 0x0002;
        const WRITE_WITHOUT_RESPONSE = 0x0004;
        const WRITE = 0x0008;
        const NOTIFY = 0x0010;
        const INDICATE = 0x0020;
        const AUTHENTICATED_SIGNED_WRITES = 0x0040;
        const RELIABLE_WRITE = 0x0100;
        const WRITABLE_AUXILIARIES = 0x0200;
        const ENCRYPT_READ = 0x0400;
        const ENCRYPT_WRITE = 0x0800;
        const ENCRYPT_AUTHENTICATED_READ = 0x1000;
        const ENCRYPT_AUTHENTICATED_WRITE = 0x2000;
    }
}

impl Properties {
    pub fn is_readable(self: &Self) -> bool {
        self.intersects(
            Properties::READ | Properties::ENCRYPT_READ | Properties::ENCRYPT_AUTHENTICATED_READ,
        )
    }

    pub fn is_writable(self: &Self) -> bool {
        self.intersects(
            Properties::WRITE
                | Properties::WRITE_WITHOUT_RESPONSE
                | Properties::AUTHENTICATED_SIGNED_WRITES
                | Properties::RELIABLE_WRITE
                | Properties::ENCRYPT_WRITE
                | Properties::ENCRYPT_AUTHENTICATED_WRITE,
        )
    }

    /// Whether a central may subscribe for server initiated updates.
    pub fn can_push(self: &Self) -> bool {
        self.intersects(Properties::NOTIFY | Properties::INDICATE)
    }

    pub fn is_read_only(self: &Self) -> bool {
        self.is_readable() && !self.is_writable()
    }
}
