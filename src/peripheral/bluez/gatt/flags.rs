use crate::gatt::Properties;

const FLAG_NAMES: [(Properties, &str); 13] = [
    (Properties::BROADCAST, "broadcast"),
    (Properties::READ, "read"),
    (Properties::WRITE_WITHOUT_RESPONSE, "write-without-response"),
    (Properties::WRITE, "write"),
    (Properties::NOTIFY, "notify"),
    (Properties::INDICATE, "indicate"),
    (
        Properties::AUTHENTICATED_SIGNED_WRITES,
        "authenticated-signed-writes",
    ),
    (Properties::RELIABLE_WRITE, "reliable-write"),
    (Properties::WRITABLE_AUXILIARIES, "writable-auxiliaries"),
    (Properties::ENCRYPT_READ, "encrypt-read"),
    (Properties::ENCRYPT_WRITE, "encrypt-write"),
    (
        Properties::ENCRYPT_AUTHENTICATED_READ,
        "encrypt-authenticated-read",
    ),
    (
        Properties::ENCRYPT_AUTHENTICATED_WRITE,
        "encrypt-authenticated-write",
    ),
];

/// The `Flags` property BlueZ expects on characteristics and descriptors.
pub trait Flags {
    fn flags(self: &Self) -> Vec<String>;
}

impl Flags for Properties {
    fn flags(self: &Self) -> Vec<String> {
        FLAG_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| String::from(*name))
            .collect()
    }
}
