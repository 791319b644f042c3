use std::path::PathBuf;

use clap::{builder::TypedValueParser, ArgGroup, Parser};

use crate::command::{Command, KvmPort};
use crate::config::{SerialConfig, DEFAULT_PORT_PATH};

/// ATEN US3344I RS485 Control
#[derive(Debug, Parser)]
#[command(name = "aten-ctrl", version, about)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["next", "port", "info"])
))]
pub struct Cli {
    /// Switch to next port
    #[arg(long)]
    pub next: bool,

    /// Switch to port number
    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..=4).try_map(KvmPort::try_from),
    )]
    pub port: Option<KvmPort>,

    /// Display firmware info
    #[arg(long)]
    pub info: bool,

    /// Serial device the KVM switch is attached to
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PORT_PATH)]
    pub device: PathBuf,

    /// Log the bytes sent and received
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The command selected by the action flags. The `action` group lets
    /// exactly one of them through, so `--next` is what remains.
    pub fn action(&self) -> Command {
        match self.port {
            Some(port) => Command::Port(port),
            None if self.info => Command::Info,
            None => Command::Next,
        }
    }

    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig::default().with_path(&self.device)
    }
}
