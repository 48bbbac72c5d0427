use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use loralog_service::DEFAULT_LIMIT;
use loralog_store::DEFAULT_DATABASE;
use loralog_transport::serial::{DEFAULT_BAUD_RATE, DEFAULT_PORT};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod doctor;
pub mod frame;
pub mod listen;
pub mod messages;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read the serial modem, store every line and serve the HTTP API.
    Listen(ListenArgs),
    /// Print the newest stored messages.
    Messages(MessagesArgs),
    /// Split a captured byte stream into lines.
    Frame(FrameArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Check the serial device and database.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Messages(args) => messages::run(args, format),
        Command::Frame(args) => frame::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct SerialArgs {
    /// Serial device path.
    #[arg(long, env = "LORALOG_SERIAL_PORT", default_value = DEFAULT_PORT)]
    pub port: String,
    /// Line speed in baud.
    #[arg(long, env = "LORALOG_BAUD_RATE", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,
    /// Upper bound on each serial read (e.g. 1s, 250ms).
    #[arg(long, env = "LORALOG_READ_TIMEOUT", default_value = "1s")]
    pub read_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub serial: SerialArgs,
    /// SQLite database file.
    #[arg(long, env = "LORALOG_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,
    /// Keep history in memory only (lost on exit). Overrides `--database`.
    #[arg(long)]
    pub memory: bool,
    /// HTTP bind address.
    #[arg(long, env = "LORALOG_API_HOST", default_value = loralog_api::DEFAULT_HOST)]
    pub host: String,
    /// HTTP port.
    #[arg(long, env = "LORALOG_API_PORT", default_value_t = loralog_api::DEFAULT_PORT)]
    pub api_port: u16,
    /// Dashboard refresh interval (e.g. 30s).
    #[arg(long, env = "LORALOG_REFRESH_INTERVAL", default_value = "30s")]
    pub refresh_interval: String,
    /// Do not start the HTTP API.
    #[arg(long)]
    pub no_api: bool,
    /// Do not mirror messages to stdout.
    #[arg(long, short = 'q')]
    pub quiet: bool,
    /// Do not store empty lines.
    #[arg(long)]
    pub skip_empty: bool,
    /// Cap on unterminated bytes carried between reads; the oldest bytes
    /// beyond it are discarded. Unbounded when omitted.
    #[arg(long, value_name = "BYTES", value_parser = parse_max_buffer)]
    pub max_buffer: Option<NonZeroUsize>,
}

#[derive(Args, Debug)]
pub struct MessagesArgs {
    /// SQLite database file.
    #[arg(long, env = "LORALOG_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,
    /// Number of messages, newest first.
    #[arg(long, short = 'n', default_value_t = DEFAULT_LIMIT, allow_negative_numbers = true)]
    pub limit: i64,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Read from a file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Cap on unterminated bytes carried between reads; the oldest bytes
    /// beyond it are discarded. Unbounded when omitted.
    #[arg(long, value_name = "BYTES", value_parser = parse_max_buffer)]
    pub max_buffer: Option<NonZeroUsize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Serial device path.
    #[arg(long, env = "LORALOG_SERIAL_PORT", default_value = DEFAULT_PORT)]
    pub port: String,
    /// SQLite database file.
    #[arg(long, env = "LORALOG_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,
}

/// Smallest accepted `--max-buffer`. A cap below one serial read would cut
/// ordinary lines that merely span two reads.
const MIN_MAX_BUFFER: usize = 1024;

fn parse_max_buffer(input: &str) -> Result<NonZeroUsize, String> {
    let value: usize = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid byte count: {input}"))?;
    if value < MIN_MAX_BUFFER {
        return Err(format!("must be at least {MIN_MAX_BUFFER} bytes"));
    }
    NonZeroUsize::new(value).ok_or_else(|| "must be greater than zero".to_string())
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = match input.strip_suffix("ms") {
        Some(num) => (num, true),
        None => (input.strip_suffix('s').unwrap_or(input), false),
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
