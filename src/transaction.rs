use std::{thread, time::Instant};

use crate::config::SerialConfig;
use crate::connection::{Connector, Link, TtyConnector};
use crate::error::SerialError;

/// Runs one write-wait-read exchange per call against the configured port.
///
/// The port is opened at the start of [`run`](Self::run) and dropped before it
/// returns, whichever way it returns. Nothing is retried.
pub struct TransactionRunner<C = TtyConnector> {
    config: SerialConfig,
    connector: C,
}

impl TransactionRunner<TtyConnector> {
    pub fn new(config: SerialConfig) -> Self {
        Self::with_connector(config, TtyConnector)
    }
}

impl<C: Connector> TransactionRunner<C> {
    pub fn with_connector(config: SerialConfig, connector: C) -> Self {
        Self { config, connector }
    }

    /// Sends `bytes` and returns the trimmed ASCII reply, which may be empty.
    pub fn run(&self, bytes: &[u8]) -> Result<String, SerialError> {
        let cfg = &self.config;
        let mut link = self
            .connector
            .open(cfg)
            .map_err(|source| SerialError::Open {
                path: cfg.path.clone(),
                source,
            })?;

        log::debug!("Sending: {:?}", String::from_utf8_lossy(bytes));
        link.send(bytes, Instant::now() + cfg.timeout)
            .map_err(SerialError::Write)?;

        thread::sleep(cfg.settle_delay);

        let raw = link
            .recv(cfg.read_size, Instant::now() + cfg.timeout)
            .map_err(SerialError::Read)?;
        log::debug!("Raw bytes: {:?}", String::from_utf8_lossy(&raw));

        Ok(decode_response(&raw))
    }
}

/// Keeps the ASCII bytes of a reply, in order, and trims surrounding whitespace.
pub fn decode_response(raw: &[u8]) -> String {
    let text: String = raw
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect();
    text.trim().to_string()
}
