//! Client: bounded ingestion queue, worker pool, periodic flusher

use crate::core::overflow_policy::should_alert;
use crate::core::{
    Batch, Config, Fields, HostInfo, LogEntry, LogLevel, LogSink, LoggerError, Metrics,
    MetricsSnapshot, OverflowPolicy, Result,
};
use crate::transport::{BulkSender, BulkTransport, HttpTransport, SenderSettings};
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on one flush, retries and backoff included
pub const FLUSH_DEADLINE: Duration = Duration::from_secs(30);

/// Longest `LogSink::sync` waits for workers to batch queued entries
const SYNC_QUEUE_WAIT: Duration = Duration::from_secs(5);

const STATE_RUNNING: u8 = 0;
const STATE_CLOSING: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// Lifecycle of a [`Client`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Accepting entries
    Running,
    /// `close` is tearing down the pipeline
    Closing,
    /// Torn down; only `metrics` and `state` remain meaningful
    Closed,
}

impl ClientState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            STATE_RUNNING => ClientState::Running,
            STATE_CLOSING => ClientState::Closing,
            _ => ClientState::Closed,
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientState::Running => write!(f, "running"),
            ClientState::Closing => write!(f, "closing"),
            ClientState::Closed => write!(f, "closed"),
        }
    }
}

/// State shared by the client handle, the workers and the flusher
struct Inner {
    queue: Receiver<LogEntry>,
    batch: Batch,
    metrics: Metrics,
    /// Entries accepted into the queue
    enqueued: AtomicU64,
    /// Entries moved from the queue into the batch
    batched: AtomicU64,
    /// Woken each time `batched` advances
    batch_progress: Notify,
    /// Held shared while an entry is admitted; `close` takes it exclusively
    /// before draining so no accepted entry lands in an unread queue
    admission: RwLock<()>,
    sender: BulkSender,
    state: AtomicU8,
    /// Stops workers' select loops and the flusher
    shutdown: CancellationToken,
    /// Aborts in-flight deliveries; only cancelled on drop without close
    delivery_cancel: CancellationToken,
    /// Flush requests to the flusher; capacity 1 so a busy flusher stalls full workers
    flush_requests: mpsc::Sender<()>,
}

impl Inner {
    fn state(&self) -> ClientState {
        ClientState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    fn add_to_batch(&self, entry: LogEntry) -> bool {
        let full = self.batch.add(entry);
        self.batched.fetch_add(1, Ordering::AcqRel);
        self.batch_progress.notify_waiters();
        full
    }

    /// Move whatever is still queued into the batch
    fn drain_queue(&self) -> usize {
        let mut drained = 0;
        for entry in self.queue.try_iter() {
            self.add_to_batch(entry);
            drained += 1;
        }
        drained
    }

    /// Deliver the current batch; returns how many entries were sent
    ///
    /// A failed batch is counted and dropped, never re-queued.
    async fn flush(&self) -> Result<usize> {
        let entries = self.batch.flush();
        if entries.is_empty() {
            return Ok(0);
        }

        let count = entries.len();
        let started = Instant::now();
        let outcome = match tokio::time::timeout(
            FLUSH_DEADLINE,
            self.sender.send_with_retry(&entries, &self.delivery_cancel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LoggerError::DeadlineExceeded(FLUSH_DEADLINE)),
        };

        match outcome {
            Ok(()) => {
                self.metrics.record_success();
                debug!(
                    entries = count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "batch delivered"
                );
                Ok(count)
            }
            Err(e) => {
                self.metrics.record_failed();
                error!(entries = count, error = %e, "batch dropped after failed delivery");
                Err(e)
            }
        }
    }
}

/// Buffered, batching log shipper
///
/// `log` is synchronous and cheap when the queue has room. In blocking mode a
/// full queue makes it wait up to five seconds, which also blocks the calling
/// runtime thread.
///
/// # Example
///
/// ```no_run
/// use rust_log_shipper::{fields, Client, LogLevel};
///
/// # async fn run() -> rust_log_shipper::Result<()> {
/// let client = Client::builder()
///     .addresses(["http://localhost:9200"])
///     .service_name("checkout")
///     .batch_size(500)
///     .build()
///     .await?;
///
/// client.log(LogLevel::Info, "order placed", fields! { "order_id" => 42 })?;
/// client.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    inner: Arc<Inner>,
    queue: Sender<LogEntry>,
    queue_capacity: usize,
    overflow_policy: OverflowPolicy,
    service_name: String,
    environment: String,
    host: Option<HostInfo>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    flusher: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Validate `config`, probe the endpoint and start the pipeline
    pub async fn new(config: Config) -> Result<Self> {
        ClientBuilder::new().config(config).build().await
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Spawn workers and the flusher around a connected sender
    fn start(config: &Config, sender: BulkSender) -> Result<Self> {
        let (queue_tx, queue_rx) = bounded(config.queue_size);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let (flush_tx, flush_rx) = mpsc::channel(1);

        let inner = Arc::new(Inner {
            queue: queue_rx,
            batch: Batch::new(config.batch_size, config.batch_timeout),
            metrics: Metrics::new(),
            enqueued: AtomicU64::new(0),
            batched: AtomicU64::new(0),
            batch_progress: Notify::new(),
            admission: RwLock::new(()),
            sender,
            state: AtomicU8::new(STATE_RUNNING),
            shutdown: CancellationToken::new(),
            delivery_cancel: CancellationToken::new(),
            flush_requests: flush_tx,
        });

        let mut workers = Vec::with_capacity(config.worker_count);
        for id in 0..config.worker_count {
            let inner = Arc::clone(&inner);
            let shutdown_rx = shutdown_rx.clone();
            let handle = thread::Builder::new()
                .name(format!("log-shipper-worker-{}", id))
                .spawn(move || run_worker(&inner, &shutdown_rx))?;
            workers.push(handle);
        }

        let flusher = tokio::spawn(run_flusher(
            Arc::clone(&inner),
            flush_rx,
            config.flush_interval,
        ));

        let host = config.enable_host_info.then(HostInfo::detect);

        info!(
            workers = config.worker_count,
            queue_size = config.queue_size,
            batch_size = config.batch_size,
            overflow = %config.overflow_policy(),
            "log shipper started"
        );

        Ok(Self {
            inner,
            queue: queue_tx,
            queue_capacity: config.queue_size,
            overflow_policy: config.overflow_policy(),
            service_name: config.service_name.clone(),
            environment: config.environment.clone(),
            host,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            workers: Mutex::new(workers),
            flusher: Mutex::new(Some(flusher)),
        })
    }

    /// Queue one entry
    ///
    /// # Errors
    ///
    /// `ClientClosed` once `close` has begun. `QueueFull` in blocking mode
    /// when no space freed up within the wait; the entry is counted as
    /// dropped.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, fields: Fields) -> Result<()> {
        let entry = self.stamp(LogEntry::new(level, message, fields));
        self.enqueue(entry)
    }

    /// Queue an entry built elsewhere; metadata the caller set is kept
    pub fn log_entry(&self, entry: LogEntry) -> Result<()> {
        self.enqueue(self.stamp(entry))
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>, fields: Fields) -> Result<()> {
        self.log(LogLevel::Debug, message, fields)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>, fields: Fields) -> Result<()> {
        self.log(LogLevel::Info, message, fields)
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>, fields: Fields) -> Result<()> {
        self.log(LogLevel::Warn, message, fields)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>, fields: Fields) -> Result<()> {
        self.log(LogLevel::Error, message, fields)
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>, fields: Fields) -> Result<()> {
        self.log(LogLevel::Fatal, message, fields)
    }

    fn stamp(&self, mut entry: LogEntry) -> LogEntry {
        if entry.service_name().is_empty() {
            entry = entry.with_service(self.service_name.as_str());
        }
        if entry.environment().is_empty() {
            entry = entry.with_environment(self.environment.as_str());
        }
        if let Some(host) = &self.host {
            if entry.host_name().is_none() && entry.host_ip().is_none() {
                entry = entry.with_host(host.name.clone(), host.ip.clone());
            }
        }
        entry
    }

    fn enqueue(&self, entry: LogEntry) -> Result<()> {
        let _admitted = self.inner.admission.read();
        if !self.inner.is_running() {
            return Err(LoggerError::ClientClosed);
        }
        self.inner.metrics.record_total();

        let entry = match self.queue.try_send(entry) {
            Ok(()) => {
                self.inner.enqueued.fetch_add(1, Ordering::AcqRel);
                return Ok(());
            }
            Err(TrySendError::Full(entry)) => entry,
            Err(TrySendError::Disconnected(_)) => return Err(LoggerError::ClientClosed),
        };

        match self.overflow_policy {
            OverflowPolicy::Discard => {
                self.record_drop();
                Ok(())
            }
            OverflowPolicy::BlockWithTimeout(wait) => match self.queue.send_timeout(entry, wait) {
                Ok(()) => {
                    self.inner.enqueued.fetch_add(1, Ordering::AcqRel);
                    Ok(())
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    self.record_drop();
                    Err(LoggerError::queue_full(self.queue_capacity, wait))
                }
                Err(SendTimeoutError::Disconnected(_)) => Err(LoggerError::ClientClosed),
            },
        }
    }

    fn record_drop(&self) {
        let dropped_before = self.inner.metrics.record_dropped();
        if should_alert(dropped_before) {
            warn!(
                dropped = dropped_before + 1,
                capacity = self.queue_capacity,
                policy = %self.overflow_policy,
                "log queue full, dropping entries"
            );
        }
    }

    /// Deliver the current batch now and wait for the outcome
    ///
    /// Entries still in the queue are not included; they go out with a
    /// later batch.
    pub async fn flush(&self) -> Result<usize> {
        if !self.inner.is_running() {
            return Err(LoggerError::ClientClosed);
        }
        self.inner.flush().await
    }

    /// Ask the flusher to deliver the current batch without waiting
    pub fn request_flush(&self) {
        if self.inner.is_running() {
            // A full channel already holds a pending request
            let _ = self.inner.flush_requests.try_send(());
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn state(&self) -> ClientState {
        self.inner.state()
    }

    /// Entries waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Entries waiting in the batch
    pub fn pending(&self) -> usize {
        self.inner.batch.len()
    }

    /// Stop accepting entries, deliver what is buffered and release the pipeline
    ///
    /// Only the first call does any work; later calls return `Ok(())`. Returns
    /// the error of the final delivery if it failed.
    pub async fn close(&self) -> Result<()> {
        if self
            .inner
            .state
            .compare_exchange(STATE_RUNNING, STATE_CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        info!("log shipper closing");

        // Wait out producers already past the state check; workers keep
        // consuming meanwhile so blocked senders can finish
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || drop(inner.admission.write())).await {
            error!(error = %e, "failed to wait for in-flight producers");
        }

        self.inner.shutdown.cancel();
        drop(self.shutdown_tx.lock().take());

        let workers = std::mem::take(&mut *self.workers.lock());
        let joined = tokio::task::spawn_blocking(move || {
            workers
                .into_iter()
                .map(|handle| handle.join())
                .filter(|result| result.is_err())
                .count()
        })
        .await;
        match joined {
            Ok(0) => {}
            Ok(panicked) => error!(panicked, "log shipper workers panicked"),
            Err(e) => error!(error = %e, "failed to join log shipper workers"),
        }

        let flusher = self.flusher.lock().take();
        if let Some(flusher) = flusher {
            if let Err(e) = flusher.await {
                error!(error = %e, "log shipper flusher failed");
            }
        }

        self.inner.drain_queue();
        let result = self.inner.flush().await;

        self.inner.sender.close();
        self.inner.state.store(STATE_CLOSED, Ordering::Release);

        let snapshot = self.inner.metrics.snapshot();
        info!(
            total = snapshot.total_logs,
            success = snapshot.success_logs,
            failed = snapshot.failed_logs,
            dropped = snapshot.dropped_logs,
            "log shipper closed"
        );

        result.map(|_| ())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if self.inner.state.swap(STATE_CLOSED, Ordering::AcqRel) == STATE_CLOSED {
            return;
        }

        self.inner.delivery_cancel.cancel();
        self.inner.shutdown.cancel();
        drop(self.shutdown_tx.lock().take());
        self.inner.sender.close();

        let discarded = self.inner.batch.clear();
        let queued = self.queue.len();
        warn!(
            discarded,
            queued,
            "log shipper dropped without close, buffered entries discarded"
        );
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state())
            .field("queued", &self.queued())
            .field("pending", &self.pending())
            .field("overflow_policy", &self.overflow_policy)
            .field("sender", &self.inner.sender)
            .finish()
    }
}

#[async_trait]
impl LogSink for Client {
    fn accept(&self, level: LogLevel, message: String, fields: Fields) -> Result<()> {
        self.log(level, message, fields)
    }

    fn accept_entry(&self, entry: LogEntry) -> Result<()> {
        self.log_entry(entry)
    }

    fn flush(&self) {
        self.request_flush();
    }

    async fn sync(&self) -> Result<()> {
        let target = self.inner.enqueued.load(Ordering::Acquire);
        let deadline = tokio::time::Instant::now() + SYNC_QUEUE_WAIT;
        loop {
            let progressed = self.inner.batch_progress.notified();
            tokio::pin!(progressed);
            // Register before checking so a notification in between is not lost
            progressed.as_mut().enable();
            if self.inner.batched.load(Ordering::Acquire) >= target {
                break;
            }
            if tokio::time::timeout_at(deadline, progressed).await.is_err() {
                warn!(enqueued = target, "timed out waiting for workers to batch queued entries");
                break;
            }
        }
        Client::flush(self).await.map(|_| ())
    }
}

/// Worker loop: move entries from the queue into the batch
fn run_worker(inner: &Inner, shutdown: &Receiver<()>) {
    loop {
        crossbeam_channel::select! {
            recv(inner.queue) -> msg => match msg {
                Ok(entry) => {
                    let dequeued = Instant::now();
                    let full = inner.add_to_batch(entry);
                    inner.metrics.record_latency(dequeued.elapsed());
                    // Blocks while a request is already pending; errors once the flusher is gone
                    if full {
                        let _ = inner.flush_requests.blocking_send(());
                    }
                }
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }

    if !inner.delivery_cancel.is_cancelled() {
        let drained = inner.drain_queue();
        if drained > 0 {
            debug!(drained, "worker drained queue on shutdown");
        }
    }
}

/// Flusher loop: age-based flushes on a tick, size-based ones on request
async fn run_flusher(inner: Arc<Inner>, mut requests: mpsc::Receiver<()>, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = inner.shutdown.cancelled() => break,
            Some(()) = requests.recv() => {
                let _ = inner.flush().await;
            }
            _ = ticker.tick() => {
                if inner.batch.should_flush() {
                    let _ = inner.flush().await;
                }
            }
        }
    }
}

/// Fluent construction of a [`Client`]
///
/// # Example
///
/// ```no_run
/// use rust_log_shipper::Client;
/// use std::time::Duration;
///
/// # async fn run() -> rust_log_shipper::Result<()> {
/// let client = Client::builder()
///     .addresses(["http://es-1:9200", "http://es-2:9200"])
///     .credentials("elastic", "changeme")
///     .index_pattern("app-{year}.{month}")
///     .flush_interval(Duration::from_secs(2))
///     .discard_on_full(true)
///     .build()
///     .await?;
/// # drop(client);
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    config: Config,
    transport: Option<Arc<dyn BulkTransport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            transport: None,
        }
    }

    /// Replace every setting at once
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn index_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.index_pattern = pattern.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.batch_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.config.queue_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.config.worker_count = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn retry_count(mut self, count: u32) -> Self {
        self.config.retry_count = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.config.retry_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_retry_backoff(mut self, max: Duration) -> Self {
        self.config.max_retry_backoff = max;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn enable_host_info(mut self, enabled: bool) -> Self {
        self.config.enable_host_info = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn enable_compression(mut self, enabled: bool) -> Self {
        self.config.enable_compression = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn discard_on_full(mut self, discard: bool) -> Self {
        self.config.discard_on_full = discard;
        self
    }

    /// Deliver through a custom transport instead of HTTP
    #[must_use = "builder methods return a new value"]
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: BulkTransport + 'static,
    {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Like [`transport`](Self::transport), for a transport the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn shared_transport(mut self, transport: Arc<dyn BulkTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate, probe the endpoint and start the pipeline
    ///
    /// Must run inside a tokio runtime, which also hosts the flusher task.
    pub async fn build(self) -> Result<Client> {
        self.config.validate()?;

        let transport: Arc<dyn BulkTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };

        let sender = BulkSender::new(transport, SenderSettings::from_config(&self.config)).await?;
        Client::start(&self.config, sender)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
