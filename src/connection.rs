use std::{
    fs::File,
    io,
    path::PathBuf,
    time::Instant,
};

use crate::config::SerialConfig;
use crate::serial_port::{port_open, port_recv, port_send};

/// An open serial line. Dropping it releases the port.
pub trait Link {
    /// Writes every byte of `bytes` or fails once `deadline` passes.
    fn send(&mut self, bytes: &[u8], deadline: Instant) -> io::Result<()>;

    /// Returns at most `limit` bytes, collected until the limit is
    /// reached or `deadline` passes. An empty vector is a valid answer.
    fn recv(&mut self, limit: usize, deadline: Instant) -> io::Result<Vec<u8>>;
}

/// Opens a [`Link`] from a [`SerialConfig`].
pub trait Connector {
    type Link: Link;

    fn open(&self, config: &SerialConfig) -> io::Result<Self::Link>;
}

/// Connector for a real tty device.
#[derive(Debug, Default, Clone, Copy)]
pub struct TtyConnector;

impl Connector for TtyConnector {
    type Link = TtyLink;

    fn open(&self, config: &SerialConfig) -> io::Result<TtyLink> {
        let file = port_open(&config.path, config.baud_rate)?;
        log::debug!("Opened {} at {} baud", config.path.display(), config.baud_rate);
        Ok(TtyLink {
            path: config.path.clone(),
            file,
            buff: Vec::new(),
            read_size: config.read_size,
        })
    }
}

/// A tty opened by [`TtyConnector`]. The fd is closed when this is dropped.
pub struct TtyLink {
    path: PathBuf,
    file: File,
    buff: Vec<u8>,
    read_size: usize,
}

impl Link for TtyLink {
    fn send(&mut self, bytes: &[u8], deadline: Instant) -> io::Result<()> {
        // Early replies land in `buff` and are handed out by the next recv
        port_send(&mut self.file, bytes, &mut self.buff, self.read_size, deadline)
    }

    fn recv(&mut self, limit: usize, deadline: Instant) -> io::Result<Vec<u8>> {
        let mut data = std::mem::take(&mut self.buff);
        data.truncate(limit);
        port_recv(&mut self.file, &mut data, limit, deadline)?;
        Ok(data)
    }
}

impl Drop for TtyLink {
    fn drop(&mut self) {
        log::debug!("Closed {}", self.path.display());
    }
}
