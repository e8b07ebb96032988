//! Reconnecting realtime client.
//!
//! The client keeps one transport connection open. When the connection
//! fails, closes, or goes quiet for longer than the heartbeat timeout, it
//! waits the fixed reconnect delay and tries again. The delay never grows
//! and there is no retry cap. State changes are published on a watch
//! channel.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use road_config::RealtimeConfig;
use road_core::events::{EventKind, RealtimeEvent};

use crate::error::ClientError;
use crate::transport::{EventStream, EventTransport};

pub type EventHandler = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Last attempt failed; a reconnect is pending.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub reconnect_delay: Duration,
    pub heartbeat_timeout: Duration,
}

impl ClientConfig {
    #[must_use]
    pub const fn from_realtime(config: &RealtimeConfig) -> Self {
        Self {
            reconnect_delay: config.reconnect_delay(),
            heartbeat_timeout: config.heartbeat_timeout(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_realtime(&RealtimeConfig::default())
    }
}

enum Ended {
    Closed,
    Failed(ClientError),
    Shutdown,
}

pub struct RealtimeClient<T> {
    transport: T,
    config: ClientConfig,
    handlers: HashMap<EventKind, Vec<EventHandler>>,
}

impl<T: EventTransport> RealtimeClient<T> {
    #[must_use]
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for one event type. Handlers run on the client
    /// task, in registration order.
    #[must_use]
    pub fn on(
        mut self,
        kind: EventKind,
        handler: impl Fn(&RealtimeEvent) + Send + Sync + 'static,
    ) -> Self {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
        self
    }

    /// Register one handler for every event type.
    #[must_use]
    pub fn on_all(mut self, handler: impl Fn(&RealtimeEvent) + Send + Sync + 'static) -> Self {
        let handler: EventHandler = Arc::new(handler);
        for kind in EventKind::ALL {
            self.handlers
                .entry(*kind)
                .or_default()
                .push(Arc::clone(&handler));
        }
        self
    }

    /// Start the connection loop on a background task.
    #[must_use]
    pub fn spawn(self) -> ClientHandle {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let attempts = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(self.run(state_tx, shutdown_rx, Arc::clone(&attempts)));
        ClientHandle {
            state: state_rx,
            shutdown: shutdown_tx,
            attempts,
            task,
        }
    }

    async fn run(
        self,
        state: watch::Sender<ConnectionState>,
        mut shutdown: watch::Receiver<bool>,
        attempts: Arc<AtomicU64>,
    ) {
        let transport = self.transport.name();
        loop {
            if *shutdown.borrow() {
                break;
            }
            state.send_replace(ConnectionState::Connecting);
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(transport, attempt, "connecting");

            let connected = tokio::select! {
                _ = shutdown.changed() => None,
                result = self.transport.connect() => Some(result),
            };
            let ended = match connected {
                None => Ended::Shutdown,
                Some(Err(e)) => Ended::Failed(e),
                Some(Ok(stream)) => {
                    info!(transport, attempt, "connected");
                    state.send_replace(ConnectionState::Connected);
                    self.pump(stream, &mut shutdown).await
                }
            };

            match ended {
                Ended::Shutdown => break,
                Ended::Closed => {
                    info!(transport, "stream closed; reconnecting");
                    state.send_replace(ConnectionState::Disconnected);
                }
                Ended::Failed(e) => {
                    warn!(transport, error = %e, "connection failed; reconnecting");
                    state.send_replace(ConnectionState::Error(e.to_string()));
                }
            }

            tokio::select! {
                _ = shutdown.changed() => break,
                () = sleep(self.config.reconnect_delay) => {}
            }
        }
        state.send_replace(ConnectionState::Disconnected);
        debug!(transport, "client stopped");
    }

    async fn pump(&self, mut stream: EventStream, shutdown: &mut watch::Receiver<bool>) -> Ended {
        let supervise = self.transport.capabilities().server_heartbeats;
        let timeout = self.config.heartbeat_timeout;
        let deadline = sleep(timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = shutdown.changed() => return Ended::Shutdown,
                () = &mut deadline, if supervise => {
                    return Ended::Failed(ClientError::HeartbeatTimeout {
                        secs: timeout.as_secs(),
                    });
                }
                item = stream.next() => match item {
                    Some(Ok(event)) => {
                        if event.kind == EventKind::Heartbeat {
                            deadline.as_mut().reset(Instant::now() + timeout);
                        }
                        self.dispatch(&event);
                    }
                    Some(Err(ClientError::Decode(message))) => {
                        warn!(%message, "skipping undecodable event");
                    }
                    Some(Err(e)) => return Ended::Failed(e),
                    None => return Ended::Closed,
                },
            }
        }
    }

    fn dispatch(&self, event: &RealtimeEvent) {
        if let Some(handlers) = self.handlers.get(&event.kind) {
            for handler in handlers {
                handler(event);
            }
        }
    }
}

/// Control handle for a spawned client. Dropping it stops the client.
pub struct ClientHandle {
    state: watch::Receiver<ConnectionState>,
    shutdown: watch::Sender<bool>,
    attempts: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl ClientHandle {
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Connection attempts made so far, including the first.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Stop the client and wait for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "client task ended abnormally");
        }
    }
}
