use std::io::{ErrorKind, Read};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{classify_read, effective_timeout, ReadOutcome, Transport};

/// TCP client transport for newline-delimited telemetry servers.
pub struct TcpTransport {
    host: String,
    port: u16,
    connect_timeout: Duration,
    stream: Option<TcpStream>,
    /// Read timeout last applied to `stream`, so it is only re-set when it changes.
    applied_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Default bound on a single connect attempt.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create an unopened transport for `host:port`.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            stream: None,
            applied_timeout: None,
        }
    }

    /// Override the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Endpoint in `host:port` form.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Address of the connected peer, if open.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let endpoint = self.endpoint();
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::Resolve {
                endpoint,
                source: std::io::Error::new(ErrorKind::NotFound, "no addresses resolved"),
            });
        }
        Ok(addrs)
    }
}

impl Transport for TcpTransport {
    fn open(&mut self) -> Result<()> {
        self.close();

        let addrs = self.resolve()?;
        let timeout = effective_timeout(self.connect_timeout);
        let mut last_err = None;

        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    let _ = stream.set_nodelay(true);
                    info!(endpoint = %self.endpoint(), %addr, "connected to telemetry server");
                    self.stream = Some(stream);
                    self.applied_timeout = None;
                    return Ok(());
                }
                Err(err) => {
                    debug!(%addr, error = %err, "connect attempt failed");
                    last_err = Some(err);
                }
            }
        }

        Err(TransportError::Connect {
            endpoint: self.endpoint(),
            source: last_err
                .unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "no addresses")),
        })
    }

    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome> {
        let stream = self.stream.as_mut().ok_or(TransportError::NotOpen)?;

        let timeout = effective_timeout(timeout);
        if self.applied_timeout != Some(timeout) {
            stream.set_read_timeout(Some(timeout))?;
            self.applied_timeout = Some(timeout);
        }

        loop {
            match stream.read(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                result => return classify_read(result),
            }
        }
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                debug!(error = %err, "socket shutdown failed (ignored)");
            }
            debug!(endpoint = %self.endpoint(), "tcp transport closed");
        }
        self.applied_timeout = None;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.endpoint())
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("endpoint", &self.endpoint())
            .field("connect_timeout", &self.connect_timeout)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[test]
    fn open_read_close() {
        let (listener, port) = listener();
        let server = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            conn.write_all(b"hello\n").unwrap();
        });

        let mut transport = TcpTransport::new("127.0.0.1", port);
        transport.open().unwrap();
        assert!(transport.is_open());
        assert!(transport.peer_addr().is_some());

        let mut buf = [0u8; 64];
        let mut received = Vec::new();
        while received.len() < 6 {
            match transport
                .read_chunk(&mut buf, Duration::from_millis(200))
                .unwrap()
            {
                ReadOutcome::Data(n) => received.extend_from_slice(&buf[..n]),
                ReadOutcome::Timeout => continue,
                ReadOutcome::Closed => break,
            }
        }
        assert_eq!(received, b"hello\n");

        server.join().unwrap();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn read_times_out_without_data() {
        let (listener, port) = listener();
        let mut transport = TcpTransport::new("127.0.0.1", port);
        transport.open().unwrap();
        let (_conn, _) = listener.accept().unwrap();

        let mut buf = [0u8; 16];
        let started = std::time::Instant::now();
        let outcome = transport
            .read_chunk(&mut buf, Duration::from_millis(50))
            .unwrap();
        assert_eq!(outcome, ReadOutcome::Timeout);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn peer_close_reports_closed() {
        let (listener, port) = listener();
        let mut transport = TcpTransport::new("127.0.0.1", port);
        transport.open().unwrap();
        let (conn, _) = listener.accept().unwrap();
        drop(conn);

        let mut buf = [0u8; 16];
        let mut outcome = ReadOutcome::Timeout;
        for _ in 0..20 {
            outcome = transport
                .read_chunk(&mut buf, Duration::from_millis(50))
                .unwrap();
            if outcome != ReadOutcome::Timeout {
                break;
            }
        }
        assert_eq!(outcome, ReadOutcome::Closed);
    }

    #[test]
    fn connect_refused_is_connect_error() {
        let (listener, port) = listener();
        drop(listener);

        let mut transport =
            TcpTransport::new("127.0.0.1", port).with_connect_timeout(Duration::from_millis(500));
        let err = transport.open().unwrap_err();
        assert!(matches!(err, TransportError::Connect { .. }));
        assert!(!transport.is_open());
    }

    #[test]
    fn read_before_open_is_not_open() {
        let mut transport = TcpTransport::new("127.0.0.1", 1);
        let mut buf = [0u8; 4];
        let err = transport
            .read_chunk(&mut buf, Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, TransportError::NotOpen));
    }

    #[test]
    fn close_is_idempotent() {
        let mut transport = TcpTransport::new("127.0.0.1", 1);
        transport.close();
        transport.close();
        assert!(!transport.is_open());
        assert_eq!(transport.describe(), "tcp://127.0.0.1:1");
    }

    #[test]
    fn reopen_after_close() {
        let (listener, port) = listener();
        let mut transport = TcpTransport::new("127.0.0.1", port);

        transport.open().unwrap();
        let _first = listener.accept().unwrap();
        transport.close();

        transport.open().unwrap();
        let _second = listener.accept().unwrap();
        assert!(transport.is_open());
    }
}
