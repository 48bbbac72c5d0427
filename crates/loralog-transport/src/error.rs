/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// The device opened but rejected line configuration.
    #[error("failed to configure {port}: {source}")]
    Configure {
        port: String,
        source: serialport::Error,
    },

    /// An I/O error occurred while reading from the device.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport has been closed.
    #[error("transport closed")]
    Closed,
}

impl TransportError {
    /// Underlying I/O error kind, when there is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            TransportError::Open { source, .. } | TransportError::Configure { source, .. } => {
                match source.kind() {
                    serialport::ErrorKind::Io(kind) => Some(kind),
                    _ => None,
                }
            }
            TransportError::Io(err) => Some(err.kind()),
            TransportError::Closed => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
