//! Realtime event envelope shared by the server broadcaster and the stream client.
//!
//! ## Wire format
//!
//! Each envelope travels as one Server-Sent Events frame:
//!
//! ```text
//! data: {"type":"gps_point_added","data":{...},"timestamp":"2026-03-01T04:12:00Z","projectId":"prj-a3f8b2c1"}
//!
//! ```
//!
//! Consumers ignore unknown fields. There is no event id and no replay.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type carried in the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// First frame on every new stream.
    Connected,
    GpsPointAdded,
    ActivityUpdate,
    ProjectUpdate,
    Notification,
    Heartbeat,
    Error,
}

impl EventKind {
    pub const ALL: &'static [Self] = &[
        Self::Connected,
        Self::GpsPointAdded,
        Self::ActivityUpdate,
        Self::ProjectUpdate,
        Self::Notification,
        Self::Heartbeat,
        Self::Error,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::GpsPointAdded => "gps_point_added",
            Self::ActivityUpdate => "activity_update",
            Self::ProjectUpdate => "project_update",
            Self::Notification => "notification",
            Self::Heartbeat => "heartbeat",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A realtime event envelope.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// Project scope the event was broadcast under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl RealtimeEvent {
    /// Build an unscoped event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
            project_id: None,
        }
    }

    /// Attach a project scope.
    #[must_use]
    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Build an event whose data is the serialized form of `payload`.
    ///
    /// # Errors
    ///
    /// Returns the serde error if `payload` cannot be represented as JSON.
    pub fn with_payload<T: Serialize>(kind: EventKind, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, serde_json::to_value(payload)?))
    }

    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(EventKind::Heartbeat, serde_json::Value::Null)
    }

    /// A user-facing notification with a title and a message.
    #[must_use]
    pub fn notification(title: &str, message: &str) -> Self {
        Self::new(
            EventKind::Notification,
            serde_json::json!({ "title": title, "message": message }),
        )
    }
}
