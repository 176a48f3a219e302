use std::sync::Arc;
use std::time::Duration;

use gnsstream_frame::Message;
use gnsstream_transport::Transport;
use tracing::{debug, error, info, warn};

use crate::cancel::CancellationToken;
use crate::channel::BoundedChannel;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::state::{ConnectionState, StateCell, StatsSnapshot, WorkerStats};
use crate::worker::{IngestionWorker, WorkerHandle};

/// Builds an unopened transport for each run of the service.
pub type TransportFactory = Box<dyn Fn(&ClientConfig) -> Box<dyn Transport> + Send + Sync>;

/// Facade over one background ingestion worker and its output queue.
///
/// ```no_run
/// use std::time::Duration;
/// use gnsstream_client::{ClientConfig, StreamingClientService};
///
/// let mut service = StreamingClientService::new(ClientConfig::tcp("localhost", 5000))?;
/// service.start();
/// while let Some(message) = service.receive(true, Some(Duration::from_secs(1))) {
///     println!("{message}");
/// }
/// service.stop();
/// # Ok::<(), gnsstream_client::ClientError>(())
/// ```
pub struct StreamingClientService {
    config: ClientConfig,
    factory: TransportFactory,
    channel: Arc<BoundedChannel<Message>>,
    state: StateCell,
    stats: Arc<WorkerStats>,
    worker: Option<WorkerHandle>,
}

impl StreamingClientService {
    /// Validate `config` and create a stopped service using the configured
    /// transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_transport_factory(config, |config| config.transport.build())
    }

    /// Like [`new`](Self::new), but transports come from `factory`.
    pub fn with_transport_factory<F>(config: ClientConfig, factory: F) -> Result<Self>
    where
        F: Fn(&ClientConfig) -> Box<dyn Transport> + Send + Sync + 'static,
    {
        config.validate()?;
        let channel = Arc::new(BoundedChannel::new(config.queue_capacity));
        Ok(Self {
            config,
            factory: Box::new(factory),
            channel,
            state: StateCell::new(ConnectionState::Stopped),
            stats: Arc::new(WorkerStats::default()),
            worker: None,
        })
    }

    /// Launch the worker without waiting for a connection.
    ///
    /// Returns `false` if a worker is already running or the thread could
    /// not be spawned.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            warn!("start requested but service is already running");
            return false;
        }
        self.reap();

        let transport = (self.factory)(&self.config);
        let endpoint = transport.describe();
        let worker = IngestionWorker::new(
            &self.config,
            transport,
            Arc::clone(&self.channel),
            CancellationToken::new(),
        )
        .with_state(self.state.clone())
        .with_stats(Arc::clone(&self.stats));

        match worker.spawn() {
            Ok(handle) => {
                info!(%endpoint, "streaming service started");
                self.worker = Some(handle);
                true
            }
            Err(err) => {
                error!(%endpoint, error = %err, "failed to start streaming service");
                self.state.set(ConnectionState::Stopped);
                false
            }
        }
    }

    /// Cancel the worker and wait up to `join_timeout` for it to exit.
    pub fn stop(&mut self) {
        if !self.is_running() {
            warn!("stop requested but service is not running");
            self.reap();
            return;
        }
        let Some(worker) = self.worker.as_mut() else {
            return;
        };

        debug!(endpoint = worker.endpoint(), "stopping streaming service");
        worker.cancel();
        if worker.join_timeout(self.config.join_timeout) {
            info!("streaming service stopped");
            self.worker = None;
        } else {
            error!(
                endpoint = worker.endpoint(),
                timeout = ?self.config.join_timeout,
                "worker did not exit in time"
            );
        }
    }

    /// Whether a worker exists and its thread has not exited.
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Take the oldest decoded message; see [`BoundedChannel::get`].
    pub fn receive(&self, block: bool, timeout: Option<Duration>) -> Option<Message> {
        self.channel.get(block, timeout)
    }

    /// Connection state of the current or most recent worker.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Counters accumulated over every run of this service.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Messages waiting to be received.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    /// Validated configuration this service was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared handle to the output queue, for consumers on other threads.
    pub fn channel(&self) -> Arc<BoundedChannel<Message>> {
        Arc::clone(&self.channel)
    }

    /// Release a worker whose thread has already exited.
    fn reap(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            if !worker.join_timeout(Duration::ZERO) {
                self.worker = Some(worker);
            } else {
                debug!(endpoint = worker.endpoint(), "reaped finished worker");
            }
        }
    }
}

impl Drop for StreamingClientService {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for StreamingClientService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingClientService")
            .field("endpoint", &self.config.transport.endpoint())
            .field("state", &self.state.get())
            .field("running", &self.is_running())
            .field("pending", &self.channel.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;

    #[test]
    fn new_rejects_invalid_config() {
        let err = StreamingClientService::new(ClientConfig::tcp("localhost", 5000).with_queue_capacity(0));
        assert!(err.is_err());
    }

    #[test]
    fn starts_stopped() {
        let service = StreamingClientService::new(ClientConfig::default()).unwrap();
        assert!(!service.is_running());
        assert_eq!(service.state(), ConnectionState::Stopped);
        assert_eq!(service.pending(), 0);
        assert!(matches!(service.config().transport, TransportConfig::Tcp { .. }));
        assert_eq!(service.receive(false, None), None);
    }

    #[test]
    fn stop_when_not_running_is_harmless() {
        let mut service = StreamingClientService::new(ClientConfig::default()).unwrap();
        service.stop();
        service.stop();
        assert!(!service.is_running());
    }
}
