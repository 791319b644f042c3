use std::io::Write;
use std::process::ExitCode;

use aten_ctrl::{send_command, Cli};
use clap::Parser;
use log::LevelFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match send_command(cli.serial_config(), cli.action()) {
        Ok(response) => {
            log::info!("Response: {response}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("Serial error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();
}
