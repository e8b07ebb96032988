//! # road-realtime
//!
//! Push notifications for Roadtrack over Server-Sent Events.
//!
//! Server side: [`ConnectionRegistry`] holds one unbounded sink per open
//! stream, fans events out with optional project scoping, and runs a
//! heartbeat task per connection. The registry is created at server start,
//! shared through application state, and drained at shutdown.
//!
//! Client side: [`RealtimeClient`] wraps an [`EventTransport`] and keeps it
//! connected. It retries after a fixed delay on any failure and treats a
//! missing heartbeat as a dead peer. [`SseTransport`] is the HTTP
//! implementation.
//!
//! Delivery is at-most-once. Nothing is buffered for disconnected clients and
//! nothing is replayed.

pub mod client;
pub mod error;
pub mod registry;
pub mod sse;
pub mod transport;

pub use client::{ClientConfig, ClientHandle, ConnectionState, RealtimeClient};
pub use error::{ClientError, RealtimeError};
pub use registry::{BroadcastReport, ConnectionInfo, ConnectionRegistry, ConnectionStream};
pub use transport::{EventStream, EventTransport, SseTransport, TransportCapabilities};
