use std::fmt;
use std::io;

use loralog_frame::FrameError;
use loralog_service::QueryError;
use loralog_store::StoreError;
use loralog_transport::TransportError;

// Process exit codes.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const STORE_ERROR: i32 = 4;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_kind_code(kind: io::ErrorKind) -> Option<i32> {
    match kind {
        io::ErrorKind::PermissionDenied => Some(PERMISSION_DENIED),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Some(TIMEOUT),
        _ => None,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::AddrInUse => FAILURE,
        kind => io_kind_code(kind).unwrap_or(INTERNAL),
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = err
        .io_kind()
        .and_then(io_kind_code)
        .unwrap_or(TRANSPORT_ERROR);
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn store_error(context: &str, err: StoreError) -> CliError {
    CliError::new(STORE_ERROR, format!("{context}: {err}"))
}

pub fn query_error(context: &str, err: QueryError) -> CliError {
    match err {
        QueryError::InvalidLimit(_) => CliError::new(USAGE, format!("{context}: {err}")),
        QueryError::Store(err) => store_error(context, err),
    }
}
