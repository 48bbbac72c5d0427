use std::io::{ErrorKind, Read};
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::ChunkSource;

/// Default device path for USB serial adapters on Linux.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Default line speed of common LoRa UART modems.
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Default upper bound on a single blocking read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Default maximum bytes returned per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Serial line configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyUSB0`, `COM3`).
    pub port: String,
    /// Line speed in baud.
    pub baud_rate: u32,
    /// Upper bound on each blocking read.
    pub read_timeout: Duration,
    /// Maximum bytes returned per chunk.
    pub chunk_size: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Serial device transport.
///
/// Opens the device as 8N1 without flow control, asserts DTR and RTS (some
/// modems stay silent otherwise) and discards stale input so reading starts
/// clean.
pub struct SerialTransport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    scratch: Vec<u8>,
}

impl SerialTransport {
    /// Open and configure a serial device.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        let configure = |source| TransportError::Configure {
            port: config.port.clone(),
            source,
        };
        port.write_data_terminal_ready(true).map_err(configure)?;
        port.write_request_to_send(true).map_err(configure)?;
        port.clear(ClearBuffer::Input).map_err(configure)?;

        info!(
            port = %config.port,
            baud_rate = config.baud_rate,
            "listening on serial port (8N1)"
        );

        Ok(Self {
            port: Some(port),
            name: config.port.clone(),
            scratch: vec![0u8; config.chunk_size.max(1)],
        })
    }

    /// Whether the device handle is still held.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// List serial devices visible to this host.
    pub fn available_ports() -> Vec<String> {
        serialport::available_ports()
            .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
            .unwrap_or_default()
    }
}

impl ChunkSource for SerialTransport {
    fn read_chunk(&mut self) -> Result<Bytes> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;
        match port.read(&mut self.scratch) {
            Ok(n) => Ok(Bytes::copy_from_slice(&self.scratch[..n])),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(Bytes::new())
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!(port = %self.name, "serial port closed");
        } else {
            debug!(port = %self.name, "serial port already closed");
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.name)
            .field("open", &self.is_open())
            .finish()
    }
}
