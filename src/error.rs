use std::{io, path::PathBuf};

use thiserror::Error;

/// Transport failure of a single serial transaction.
///
/// The port has always been released by the time one of these is returned.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("could not open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),
}

/// Rejected user intent, raised before any byte reaches the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("KVM port {0} is out of range (expected 1 to 4)")]
    PortOutOfRange(u8),
}
