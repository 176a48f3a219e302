use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{classify_read, effective_timeout, ReadOutcome, Transport};

/// Serial/UART transport for a positioning receiver.
///
/// Opens the device 8N1 without flow control, which is what GNSS modules
/// ship with.
pub struct SerialTransport {
    path: PathBuf,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    applied_timeout: Option<Duration>,
}

impl SerialTransport {
    /// Common default for u-blox and similar receivers over USB/UART.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Timeout used for the open call itself; reads set their own.
    const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

    /// Create an unopened transport for the device at `path`.
    pub fn new(path: impl AsRef<Path>, baud_rate: u32) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            baud_rate,
            port: None,
            applied_timeout: None,
        }
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        self.close();

        let path = self.path.to_string_lossy();
        let port = serialport::new(path.as_ref(), self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Self::OPEN_TIMEOUT)
            .open()
            .map_err(|source| TransportError::SerialOpen {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path.display(), baud = self.baud_rate, "opened serial device");
        self.port = Some(port);
        self.applied_timeout = Some(Self::OPEN_TIMEOUT);
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;

        let timeout = effective_timeout(timeout);
        if self.applied_timeout != Some(timeout) {
            port.set_timeout(timeout)
                .map_err(|err| TransportError::Io(err.into()))?;
            self.applied_timeout = Some(timeout);
        }

        loop {
            match port.read(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                result => return classify_read(result),
            }
        }
    }

    fn close(&mut self) {
        // Dropping the boxed port closes the descriptor; there is no shutdown phase.
        if self.port.take().is_some() {
            debug!(path = %self.path.display(), "serial device closed");
        }
        self.applied_timeout = None;
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn describe(&self) -> String {
        format!("serial://{}@{}", self.path.display(), self.baud_rate)
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}
