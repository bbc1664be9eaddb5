// skyanchor_core/src/telemetry/listener.rs

//! UDP receive loop feeding the [`TelemetryStore`].
//!
//! The loop runs on its own thread and blocks in `recv_from` for at most one
//! receive timeout, so a `stop()` request is noticed within that interval.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(TelemetryStore::new());
//! let mut listener = TelemetryListener::new(ListenerConfig::default(), store.clone());
//! listener.start_configured()?;
//!
//! // Once per frame, on the consumer side:
//! let sample = store.read();
//! ```

use parking_lot::Mutex;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use super::store::TelemetryStore;
use crate::config::{ConfigError, ListenerConfig};
use crate::protocol::{self, Severity, TelemetryMessage};

/// Maximum UDP datagram size.
const MAX_DATAGRAM_SIZE: usize = 65536;

/// Errors that stop the listener from running at all.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("socket fault on {endpoint}: {source}")]
    SocketFault {
        endpoint: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn the receive thread: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Lifecycle of the receive loop as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListenerStatus {
    #[default]
    Stopped,
    Running,
    /// The loop hit an unrecoverable socket error and exited. Not restarted automatically.
    Faulted(String),
}

/// Counters since the last `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenerStats {
    pub datagrams_received: u64,
    pub messages_published: u64,
    pub messages_ignored: u64,
    pub decode_errors: u64,
}

#[derive(Default)]
struct Counters {
    datagrams_received: AtomicU64,
    messages_published: AtomicU64,
    messages_ignored: AtomicU64,
    decode_errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> ListenerStats {
        ListenerStats {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
        }
    }
}

/// State shared between the owner and one run of the receive loop.
struct RunState {
    stop: AtomicBool,
    counters: Counters,
}

/// Owns the UDP socket and the thread that reads from it.
pub struct TelemetryListener {
    config: ListenerConfig,
    store: Arc<TelemetryStore>,
    status: Arc<Mutex<ListenerStatus>>,
    run: Option<Arc<RunState>>,
    worker: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl TelemetryListener {
    pub fn new(config: ListenerConfig, store: Arc<TelemetryStore>) -> Self {
        Self {
            config,
            store,
            status: Arc::new(Mutex::new(ListenerStatus::Stopped)),
            run: None,
            worker: None,
            local_addr: None,
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    /// Starts on the endpoint from the configuration.
    pub fn start_configured(&mut self) -> Result<SocketAddr, ListenerError> {
        let endpoint = self.config.endpoint();
        self.start(endpoint)
    }

    /// Binds `endpoint` and launches the receive loop.
    ///
    /// A loop that is already running is fully stopped and joined first, and
    /// the store is reset, so two loops never write the same store. Returns the
    /// bound address (useful when binding port 0).
    pub fn start(&mut self, endpoint: SocketAddr) -> Result<SocketAddr, ListenerError> {
        self.config.validate()?;
        self.stop();
        self.store.reset();

        // --- 1. Bind and configure the socket ---
        let socket = match bind(endpoint, &self.config) {
            Ok(socket) => socket,
            Err(source) => {
                error!(%endpoint, error = %source, "Failed to bind telemetry socket");
                *self.status.lock() = ListenerStatus::Faulted(source.to_string());
                return Err(ListenerError::SocketFault { endpoint, source });
            }
        };
        let local_addr = socket.local_addr().unwrap_or(endpoint);

        // --- 2. Launch the loop ---
        let run = Arc::new(RunState {
            stop: AtomicBool::new(false),
            counters: Counters::default(),
        });
        *self.status.lock() = ListenerStatus::Running;

        let worker = {
            let run = run.clone();
            let store = self.store.clone();
            let status = self.status.clone();
            thread::Builder::new()
                .name("telemetry-listener".to_string())
                .spawn(move || receive_loop(socket, store, run, status))
        };
        let worker = match worker {
            Ok(handle) => handle,
            Err(e) => {
                *self.status.lock() = ListenerStatus::Faulted(e.to_string());
                return Err(ListenerError::Spawn(e));
            }
        };

        info!(
            %local_addr,
            timeout_ms = self.config.receive_timeout.as_millis() as u64,
            "Telemetry listener started"
        );
        self.run = Some(run);
        self.worker = Some(worker);
        self.local_addr = Some(local_addr);
        Ok(local_addr)
    }

    /// Signals the loop to exit and joins it, releasing the socket.
    ///
    /// Returns within roughly one receive timeout. Safe to call when not running.
    pub fn stop(&mut self) {
        // The run state is kept so `stats()` still reports the finished run.
        if let Some(run) = &self.run {
            run.stop.store(true, Ordering::Release);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Telemetry receive thread panicked");
            }
            debug!("Telemetry listener joined");
        }
        self.local_addr = None;
        *self.status.lock() = ListenerStatus::Stopped;
    }

    pub fn status(&self) -> ListenerStatus {
        self.status.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.status() == ListenerStatus::Running
    }

    /// Counters of the current (or most recent) run.
    pub fn stats(&self) -> ListenerStats {
        self.run
            .as_ref()
            .map(|run| run.counters.snapshot())
            .unwrap_or_default()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

impl Drop for TelemetryListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind(endpoint: SocketAddr, config: &ListenerConfig) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind(endpoint)?;
    socket.set_read_timeout(Some(config.receive_timeout))?;
    Ok(socket)
}

/// Errors that just mean "nothing arrived yet, go around again".
fn is_transient(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::Interrupted
            // Windows reports ICMP port-unreachable on the receiving socket.
            | io::ErrorKind::ConnectionReset
    )
}

fn receive_loop(
    socket: UdpSocket,
    store: Arc<TelemetryStore>,
    run: Arc<RunState>,
    status: Arc<Mutex<ListenerStatus>>,
) {
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
    let counters = &run.counters;

    while !run.stop.load(Ordering::Acquire) {
        let (len, src) = match socket.recv_from(&mut buffer) {
            Ok(result) => result,
            Err(e) if is_transient(e.kind()) => {
                trace!("No telemetry received (timeout)");
                continue;
            }
            Err(e) => {
                error!(error = %e, "Telemetry socket fault, receive loop exiting");
                *status.lock() = ListenerStatus::Faulted(e.to_string());
                return;
            }
        };

        let received = counters.datagrams_received.fetch_add(1, Ordering::Relaxed) + 1;
        if received == 1 {
            info!(%src, len, "Received first telemetry datagram");
        }

        for frame in protocol::frames(&buffer[..len]) {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                    warn!(%src, error = %e, "Discarding malformed telemetry frame");
                    break;
                }
            };

            if let TelemetryMessage::StatusText(text) = &frame.message {
                log_status_text(frame.header.system_id, &text.text, text.severity);
            }

            match store.publish(&frame.message) {
                Some(_) => counters.messages_published.fetch_add(1, Ordering::Relaxed),
                None => counters.messages_ignored.fetch_add(1, Ordering::Relaxed),
            };
        }
    }

    let stats = counters.snapshot();
    info!(
        datagrams = stats.datagrams_received,
        published = stats.messages_published,
        decode_errors = stats.decode_errors,
        "Telemetry listener stopped"
    );
}

fn log_status_text(system_id: u8, text: &str, severity: Severity) {
    if severity <= Severity::Error {
        warn!(system_id, ?severity, "Status: {}", text);
    } else {
        info!(system_id, ?severity, "Status: {}", text);
    }
}
