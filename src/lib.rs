mod cli;
mod command;
mod config;
mod connection;
mod error;
mod serial_port;
mod transaction;

pub use cli::Cli;
pub use command::{Command, KvmPort};
pub use config::{
    SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_PORT_PATH, DEFAULT_READ_SIZE, DEFAULT_SETTLE_DELAY,
    DEFAULT_TIMEOUT,
};
pub use connection::{Connector, Link, TtyConnector, TtyLink};
pub use error::{CommandError, SerialError};
pub use transaction::{decode_response, TransactionRunner};

/// # ATEN KVM Control
///
/// Sends one command to an ATEN US3344I KVM switch over its RS485 serial
/// line and returns the decoded reply.
///
/// 1. Opens the tty non-blocking, in raw mode, at the configured baud rate.
/// 2. Writes the command and waits the settle delay.
/// 3. Reads up to the read cap or until the timeout.
/// 4. Drops non-ASCII bytes and trims whitespace.
///
/// The port is closed again before this returns. Nothing is retried.
pub fn send_command(config: SerialConfig, command: Command) -> Result<String, SerialError> {
    TransactionRunner::new(config).run(&command.to_bytes())
}
