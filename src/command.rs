use std::{borrow::Cow, fmt};

use crate::error::CommandError;

/// A KVM input port number. Only 1 through 4 exist on the US3344I.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KvmPort(u8);

impl KvmPort {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for KvmPort {
    type Error = CommandError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(CommandError::PortOutOfRange(n))
        }
    }
}

impl fmt::Display for KvmPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A command understood by the KVM switch over its RS485 line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch to the next port.
    Next,
    /// Query the firmware info.
    Info,
    /// Switch to the given port.
    Port(KvmPort),
}

impl Command {
    /// Builds a [`Command::Port`] after checking the port range.
    pub fn port(n: u8) -> Result<Self, CommandError> {
        KvmPort::try_from(n).map(Command::Port)
    }

    /// The exact bytes to put on the wire, carriage return included.
    pub fn to_bytes(&self) -> Cow<'static, [u8]> {
        match self {
            Command::Next => Cow::Borrowed(b"sw\r"),
            Command::Info => Cow::Borrowed(b"info\r"),
            Command::Port(port) => Cow::Owned(format!("sw p0{port}\r").into_bytes()),
        }
    }
}
