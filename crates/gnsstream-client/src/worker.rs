use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gnsstream_frame::{Framing, Message};
use gnsstream_transport::{ReadOutcome, Transport, TransportError};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, info_span, trace, warn};

use crate::cancel::CancellationToken;
use crate::channel::BoundedChannel;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::retry::RetryPolicy;
use crate::state::{ConnectionState, StateCell, StatsSnapshot, WorkerStats};

/// Why a connected session ended.
#[derive(Debug)]
enum SessionEnd {
    Cancelled,
    PeerClosed,
    Failed(TransportError),
    Overflow,
}

/// Connect, read, decode and enqueue loop for one transport.
///
/// The worker owns its transport exclusively. It shares only the output
/// channel, the state cell and the stats counters with the outside world.
pub struct IngestionWorker {
    transport: Box<dyn Transport>,
    framing: Framing,
    max_buffer: usize,
    chunk_size: usize,
    read_timeout: Duration,
    retry: RetryPolicy,
    channel: Arc<BoundedChannel<Message>>,
    state: StateCell,
    stats: Arc<WorkerStats>,
    cancel: CancellationToken,
}

impl IngestionWorker {
    /// Create a worker with fresh state and stats.
    pub fn new(
        config: &ClientConfig,
        transport: Box<dyn Transport>,
        channel: Arc<BoundedChannel<Message>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            framing: config.framing.clone(),
            max_buffer: config.max_buffer_bytes,
            chunk_size: config.chunk_size.max(1),
            read_timeout: config.read_timeout,
            retry: config.retry,
            channel,
            state: StateCell::new(ConnectionState::Disconnected),
            stats: Arc::new(WorkerStats::default()),
            cancel,
        }
    }

    /// Report into an existing state cell, e.g. one owned by a service that
    /// outlives individual runs.
    pub fn with_state(mut self, state: StateCell) -> Self {
        self.state = state;
        self
    }

    /// Accumulate into existing counters.
    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Run the loop on a dedicated thread.
    ///
    /// The thread inherits the tracing dispatcher current on the calling
    /// thread and runs inside a span naming the endpoint.
    pub fn spawn(self) -> Result<WorkerHandle> {
        let endpoint = self.transport.describe();
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let done = Arc::new(Latch::default());
        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let stats = Arc::clone(&self.stats);

        state.set(ConnectionState::Disconnected);
        let thread = {
            let done = Arc::clone(&done);
            let endpoint = endpoint.clone();
            thread::Builder::new()
                .name("gnsstream-ingest".to_string())
                .spawn(move || {
                    let _done = LatchGuard(done);
                    tracing::dispatcher::with_default(&dispatch, || {
                        let span = info_span!("ingest", endpoint = %endpoint);
                        let _entered = span.enter();
                        self.run();
                    });
                })
                .map_err(ClientError::Spawn)?
        };

        Ok(WorkerHandle {
            thread: Some(thread),
            done,
            cancel,
            state,
            stats,
            endpoint,
        })
    }

    /// Drive the state machine on the current thread until cancelled or the
    /// retry policy gives up.
    pub fn run(mut self) {
        debug!(framing = ?self.framing, read_timeout = ?self.read_timeout, "worker started");
        let mut failures: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.state.set(ConnectionState::Connecting);
            self.stats.record_connect_attempt();
            if let Err(err) = self.transport.open() {
                self.transport.close();
                failures = failures.saturating_add(1);
                let Some(delay) = self.retry.delay_for(failures) else {
                    error!(error = %err, attempt = failures, "connect failed, giving up");
                    break;
                };
                error!(error = %err, attempt = failures, retry_in = ?delay, "connect failed");
                if self.cancel.wait_timeout(delay) {
                    break;
                }
                continue;
            }

            self.state.set(ConnectionState::Connected);
            self.stats.record_connection();
            info!("connected");

            let (end, received) = self.session();
            self.transport.close();
            match end {
                SessionEnd::Cancelled => break,
                SessionEnd::PeerClosed => warn!(received, "connection closed by peer"),
                SessionEnd::Failed(err) => warn!(error = %err, received, "connection lost"),
                SessionEnd::Overflow => warn!("connection dropped after framing overflow"),
            }
            self.state.set(ConnectionState::Disconnected);

            if received > 0 {
                failures = 0;
                continue;
            }

            // A peer that accepts and hangs up counts against the retry policy.
            failures = failures.saturating_add(1);
            let Some(delay) = self.retry.delay_for(failures) else {
                error!(attempt = failures, "connection yielded no data, giving up");
                break;
            };
            debug!(attempt = failures, retry_in = ?delay, "connection yielded no data");
            if self.cancel.wait_timeout(delay) {
                break;
            }
        }

        self.state.set(ConnectionState::Stopping);
        self.transport.close();
        self.state.set(ConnectionState::Stopped);
        info!(stats = ?self.stats.snapshot(), "worker stopped");
    }

    /// Read until the connection ends, returning why it ended and how many
    /// bytes it delivered. A fresh decoder per session keeps partial data
    /// from one connection out of the next.
    fn session(&mut self) -> (SessionEnd, u64) {
        let mut decoder = self.framing.decoder(self.max_buffer);
        let mut buf = vec![0u8; self.chunk_size];
        let mut received: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return (SessionEnd::Cancelled, received);
            }

            let n = match self.transport.read_chunk(&mut buf, self.read_timeout) {
                Ok(ReadOutcome::Data(n)) => n,
                Ok(ReadOutcome::Timeout) => continue,
                Ok(ReadOutcome::Closed) => return (SessionEnd::PeerClosed, received),
                Err(err) => return (SessionEnd::Failed(err), received),
            };

            received = received.saturating_add(n as u64);
            self.stats.record_bytes(n);
            let messages = match decoder.decode(&buf[..n]) {
                Ok(messages) => messages,
                Err(err) => {
                    error!(error = %err, decoder = decoder.name(), "framing overflow");
                    self.stats.record_overflow();
                    return (SessionEnd::Overflow, received);
                }
            };

            for message in messages {
                let evicted = self.channel.put(message);
                if let Some(oldest) = &evicted {
                    trace!(dropped = %oldest, "queue full, evicted oldest");
                }
                self.stats.record_message(evicted.is_some());
            }
        }
    }
}

impl std::fmt::Debug for IngestionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionWorker")
            .field("transport", &self.transport.describe())
            .field("framing", &self.framing)
            .field("read_timeout", &self.read_timeout)
            .field("retry", &self.retry)
            .field("state", &self.state.get())
            .finish()
    }
}

/// One-shot "thread finished" signal, set even if the worker panics.
#[derive(Default)]
struct Latch {
    set: Mutex<bool>,
    changed: Condvar,
}

impl Latch {
    fn set(&self) {
        *self.set.lock() = true;
        self.changed.notify_all();
    }

    fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut set = self.set.lock();
        if !*set {
            self.changed.wait_while_for(&mut set, |set| !*set, timeout);
        }
        *set
    }
}

struct LatchGuard(Arc<Latch>);

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// Owner's side of a spawned [`IngestionWorker`].
///
/// Dropping the handle cancels the worker without waiting for it.
pub struct WorkerHandle {
    thread: Option<JoinHandle<()>>,
    done: Arc<Latch>,
    cancel: CancellationToken,
    state: StateCell,
    stats: Arc<WorkerStats>,
    endpoint: String,
}

impl WorkerHandle {
    /// Signal the worker to stop at its next cancellation check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait up to `timeout` for the worker thread to exit.
    ///
    /// Returns `true` once the thread has been joined; `false` leaves the
    /// handle intact so the caller can keep observing it.
    pub fn join_timeout(&mut self, timeout: Duration) -> bool {
        if self.thread.is_none() {
            return true;
        }
        if !self.done.wait_timeout(timeout) {
            return false;
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(endpoint = %self.endpoint, "worker thread panicked");
            }
        }
        true
    }

    /// Current connection state of the worker.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Snapshot of the worker's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Transport endpoint the worker reads from.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state.get())
            .field("finished", &self.is_finished())
            .finish()
    }
}
