//! Pairing agent: the authorization and passkey callbacks answered on behalf
//! of the local user while a central pairs.
//!
//! Passkey entry never blocks the event loop. The handler receives a
//! [`PasskeyReply`] and answers whenever input becomes available; dropping the
//! reply cancels the request on the remote side.

use futures::{
    channel::{mpsc, oneshot},
    StreamExt,
};
use log::{debug, info, warn};
use std::{fmt, str::FromStr};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    task::JoinHandle,
};

use crate::{device::Device, Error, ErrorType};

/// Answer used when the passkey input could not be read.
pub const PASSKEY_SENTINEL: u32 = 0;

const PASSKEY_MAX: u32 = 999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoCapability {
    DisplayOnly,
    DisplayYesNo,
    KeyboardOnly,
    NoInputNoOutput,
    KeyboardDisplay,
}

impl IoCapability {
    pub fn as_str(self: &Self) -> &'static str {
        match self {
            IoCapability::DisplayOnly => "DisplayOnly",
            IoCapability::DisplayYesNo => "DisplayYesNo",
            IoCapability::KeyboardOnly => "KeyboardOnly",
            IoCapability::NoInputNoOutput => "NoInputNoOutput",
            IoCapability::KeyboardDisplay => "KeyboardDisplay",
        }
    }
}

impl fmt::Display for IoCapability {
    fn fmt(self: &Self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IoCapability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DisplayOnly" => Ok(IoCapability::DisplayOnly),
            "DisplayYesNo" => Ok(IoCapability::DisplayYesNo),
            "KeyboardOnly" => Ok(IoCapability::KeyboardOnly),
            "NoInputNoOutput" => Ok(IoCapability::NoInputNoOutput),
            "KeyboardDisplay" => Ok(IoCapability::KeyboardDisplay),
            other => Err(Error::new(
                "InvalidIoCapability",
                format!("unknown io capability {:?}", other),
                ErrorType::Bluez,
            )),
        }
    }
}

/// The agent object registered with the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    path: String,
    capability: IoCapability,
}

impl Agent {
    pub fn new<T: Into<String>>(path: T, capability: IoCapability) -> Self {
        Agent {
            path: path.into(),
            capability,
        }
    }

    pub fn path(self: &Self) -> &str {
        &self.path
    }

    pub fn capability(self: &Self) -> IoCapability {
        self.capability
    }
}

/// One-shot answer slot for an outstanding passkey request.
#[derive(Debug)]
pub struct PasskeyReply(oneshot::Sender<u32>);

impl PasskeyReply {
    pub fn channel() -> (PasskeyReply, oneshot::Receiver<u32>) {
        let (sender, receiver) = oneshot::channel();
        (PasskeyReply(sender), receiver)
    }

    /// Delivers the passkey. Returns `false` if the request was already
    /// cancelled by the transport.
    pub fn send(self: Self, passkey: u32) -> bool {
        self.0.send(passkey).is_ok()
    }

    pub fn is_canceled(self: &Self) -> bool {
        self.0.is_canceled()
    }
}

pub trait PairingHandler {
    /// Decides whether `device` may pair. Authorizes everything by default.
    fn on_authorization_request(self: &mut Self, _device: &Device) -> bool {
        true
    }

    /// Starts a passkey prompt for `device`; must return without waiting for
    /// the answer.
    fn on_passkey_request(self: &mut Self, device: &Device, reply: PasskeyReply);

    /// Drops every prompt still waiting for input.
    fn abandon(self: &mut Self) {}
}

/// Parses a 6 digit passkey as typed by the user.
pub fn parse_passkey(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() || input.len() > 6 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse::<u32>().ok().filter(|passkey| *passkey <= PASSKEY_MAX)
}

type Prompt = (Device, PasskeyReply);

/// Reads passkeys from standard input on a task of its own, one line per
/// request, in request order.
#[derive(Debug, Default)]
pub struct ConsolePairing {
    prompts: Option<mpsc::UnboundedSender<Prompt>>,
    reader: Option<JoinHandle<()>>,
}

impl ConsolePairing {
    pub fn new() -> Self {
        ConsolePairing::default()
    }

    fn prompts(self: &mut Self) -> &mpsc::UnboundedSender<Prompt> {
        let reader = &mut self.reader;
        self.prompts.get_or_insert_with(|| {
            let (sender, receiver) = mpsc::unbounded();
            *reader = Some(tokio::spawn(read_passkeys(receiver)));
            sender
        })
    }
}

impl PairingHandler for ConsolePairing {
    fn on_authorization_request(self: &mut Self, device: &Device) -> bool {
        debug!("requesting authorization for '{}'", device.display_name());
        true
    }

    fn on_passkey_request(self: &mut Self, device: &Device, reply: PasskeyReply) {
        debug!("requesting passkey for '{}'", device.display_name());
        if let Err(err) = self.prompts().unbounded_send((device.clone(), reply)) {
            warn!("passkey prompt unavailable: {}", err);
        }
    }

    fn abandon(self: &mut Self) {
        self.prompts.take();
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

impl Drop for ConsolePairing {
    fn drop(self: &mut Self) {
        self.abandon();
    }
}

async fn read_passkeys(mut prompts: mpsc::UnboundedReceiver<Prompt>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some((device, reply)) = prompts.next().await {
        if reply.is_canceled() {
            continue;
        }
        info!("Enter 6 digit pin code for '{}': ", device.display_name());
        let passkey = match lines.next_line().await {
            Ok(Some(line)) => parse_passkey(&line).unwrap_or_else(|| {
                warn!("didn't read a pin code from {:?}", line);
                PASSKEY_SENTINEL
            }),
            Ok(None) => {
                warn!("didn't read a pin code, standard input is closed");
                PASSKEY_SENTINEL
            }
            Err(err) => {
                warn!("didn't read a pin code: {}", err);
                PASSKEY_SENTINEL
            }
        };
        if !reply.send(passkey) {
            debug!("passkey for '{}' arrived after cancellation", device.display_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_digits() {
        assert_eq!(parse_passkey("123456\n"), Some(123_456));
        assert_eq!(parse_passkey(" 000042 "), Some(42));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_passkey(""), None);
        assert_eq!(parse_passkey("12a456"), None);
        assert_eq!(parse_passkey("1234567"), None);
        assert_eq!(parse_passkey("-12345"), None);
    }

    #[test]
    fn io_capability_round_trips_bluez_names() {
        let capability: IoCapability = "KeyboardDisplay".parse().unwrap();
        assert_eq!(capability, IoCapability::KeyboardDisplay);
        assert!("Keyboard".parse::<IoCapability>().is_err());
    }

    #[test]
    fn dropped_reply_reads_as_canceled() {
        let (reply, receiver) = PasskeyReply::channel();
        drop(receiver);
        assert!(reply.is_canceled());
        assert!(!reply.send(123_456));
    }
}
