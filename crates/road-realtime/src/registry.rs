//! Connection registry and broadcaster for event streams.
//!
//! Each open stream is one entry holding an unbounded sink. Broadcasts
//! serialize the envelope once and push the same `Arc<str>` into every
//! matching sink. A sink whose receiver is gone is removed on the spot.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use road_core::enums::Role;
use road_core::events::{EventKind, RealtimeEvent};

use crate::error::RealtimeError;

/// Serialized envelope as pushed to a connection.
pub type Frame = Arc<str>;

struct Connection {
    sender: mpsc::UnboundedSender<Frame>,
    user_id: String,
    role: Role,
    project_id: Option<String>,
    connected_at: DateTime<Utc>,
}

/// Public view of a registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub project_id: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// Outcome of one broadcast.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    /// Connections the frame was handed to.
    pub delivered: usize,
    /// Connections found closed and removed.
    pub dropped: usize,
}

pub struct ConnectionRegistry {
    connections: DashMap<String, Connection>,
    next_id: AtomicU64,
    heartbeat_interval: Duration,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish()
    }
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(0),
            heartbeat_interval,
        }
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Store a connection under `id`. An existing entry with the same id is
    /// replaced, which closes its stream.
    pub fn register(
        &self,
        id: impl Into<String>,
        sender: mpsc::UnboundedSender<Frame>,
        user_id: impl Into<String>,
        role: Role,
        project_id: Option<String>,
    ) {
        let id = id.into();
        let user_id = user_id.into();
        debug!(connection_id = %id, %user_id, ?project_id, "connection registered");
        self.connections.insert(
            id,
            Connection {
                sender,
                user_id,
                role,
                project_id,
                connected_at: Utc::now(),
            },
        );
    }

    /// Open a new stream: allocate an id, register it, queue the `connected`
    /// event, and start its heartbeat. Dropping the returned stream
    /// unregisters the connection.
    pub fn connect(
        self: &Arc<Self>,
        user_id: &str,
        role: Role,
        project_id: Option<String>,
    ) -> ConnectionStream {
        let id = format!("conn-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(id.clone(), tx, user_id, role, project_id.clone());

        let connected = RealtimeEvent::new(
            EventKind::Connected,
            serde_json::json!({ "connectionId": id, "projectId": project_id }),
        );
        self.send_to(&id, &connected);

        ConnectionStream {
            heartbeat: self.spawn_heartbeat(id.clone()),
            inner: UnboundedReceiverStream::new(rx),
            registry: Arc::clone(self),
            id,
        }
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.connections.remove(id).is_some();
        if removed {
            debug!(connection_id = %id, "connection unregistered");
        }
        removed
    }

    /// Deliver an event. With `project_id`, the scope is stamped on the
    /// envelope and connections registered for another project skip it;
    /// unscoped connections receive everything.
    ///
    /// # Errors
    ///
    /// `Serialization` if the envelope cannot be encoded. Delivery failures
    /// are not errors; they show up in the report.
    pub fn broadcast(
        &self,
        mut event: RealtimeEvent,
        project_id: Option<&str>,
    ) -> Result<BroadcastReport, RealtimeError> {
        if let Some(project_id) = project_id {
            event.project_id = Some(project_id.to_string());
        }
        let frame: Frame = serde_json::to_string(&event)?.into();

        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();
        for entry in &self.connections {
            if project_id.is_some_and(|scope| {
                entry.project_id.as_deref().is_some_and(|own| own != scope)
            }) {
                continue;
            }
            if entry.sender.send(Arc::clone(&frame)).is_ok() {
                report.delivered += 1;
            } else {
                closed.push(entry.key().clone());
            }
        }
        for id in closed {
            if self.connections.remove(&id).is_some() {
                report.dropped += 1;
                debug!(connection_id = %id, "dropped closed connection during broadcast");
            }
        }
        debug!(
            kind = %event.kind,
            ?project_id,
            delivered = report.delivered,
            dropped = report.dropped,
            "broadcast"
        );
        Ok(report)
    }

    /// Send an event to one connection. Returns `false` if the connection
    /// is unknown or closed; a closed connection is removed.
    pub fn send_to(&self, id: &str, event: &RealtimeEvent) -> bool {
        let frame: Frame = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::warn!(error = %e, "unserializable event");
                return false;
            }
        };
        let sent = match self.connections.get(id) {
            Some(conn) => conn.sender.send(frame).is_ok(),
            None => return false,
        };
        if !sent {
            self.unregister(id);
        }
        sent
    }

    /// Emit a `heartbeat` to `id` every interval until the connection is
    /// gone or the registry is dropped.
    pub fn spawn_heartbeat(self: &Arc<Self>, id: String) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.heartbeat_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                if !registry.send_to(&id, &RealtimeEvent::heartbeat()) {
                    break;
                }
            }
            debug!(connection_id = %id, "heartbeat stopped");
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Registered connections, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .connections
            .iter()
            .map(|entry| ConnectionInfo {
                id: entry.key().clone(),
                user_id: entry.user_id.clone(),
                role: entry.role,
                project_id: entry.project_id.clone(),
                connected_at: entry.connected_at,
            })
            .collect();
        infos.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then_with(|| a.id.cmp(&b.id)));
        infos
    }

    /// Close every stream. Returns how many were open.
    pub fn drain(&self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        debug!(count, "registry drained");
        count
    }
}

/// Receiving half of a registered connection.
///
/// Yields serialized envelopes. Ends when the registry drops the connection.
/// Dropping it unregisters the connection and stops its heartbeat.
pub struct ConnectionStream {
    id: String,
    inner: UnboundedReceiverStream<Frame>,
    registry: Arc<ConnectionRegistry>,
    heartbeat: JoinHandle<()>,
}

impl ConnectionStream {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Stream for ConnectionStream {
    type Item = Frame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.poll_next_unpin(cx)
    }
}

impl Drop for ConnectionStream {
    fn drop(&mut self) {
        self.heartbeat.abort();
        self.registry.unregister(&self.id);
    }
}
