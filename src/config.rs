use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_PORT_PATH: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: u32 = 38400;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_READ_SIZE: usize = 100;
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Serial line settings for talking to the KVM switch.
///
/// `timeout` bounds both the write and the read of a transaction, and
/// `settle_delay` is the pause between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    pub path: PathBuf,
    pub baud_rate: u32,
    pub timeout: Duration,
    pub read_size: usize,
    pub settle_delay: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PORT_PATH),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            read_size: DEFAULT_READ_SIZE,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SerialConfig {
    pub fn with_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().into();
        self
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_size(mut self, read_size: usize) -> Self {
        self.read_size = read_size;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_us3344i_line() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.path, Path::new("/dev/ttyUSB0"));
        assert_eq!(cfg.baud_rate, 38400);
        assert_eq!(cfg.timeout, Duration::from_secs(1));
        assert_eq!(cfg.read_size, 100);
        assert_eq!(cfg.settle_delay, Duration::from_millis(100));
    }

    #[test]
    fn builders_override_single_fields() {
        let cfg = SerialConfig::default()
            .with_path("/dev/ttyS1")
            .with_settle_delay(Duration::ZERO);
        assert_eq!(cfg.path, Path::new("/dev/ttyS1"));
        assert_eq!(cfg.settle_delay, Duration::ZERO);
        assert_eq!(cfg.baud_rate, DEFAULT_BAUD_RATE);
    }
}
