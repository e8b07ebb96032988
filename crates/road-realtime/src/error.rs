use thiserror::Error;

/// Server-side registry errors.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Client-side connection errors. All of them lead to a reconnect.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}")]
    Status { status: u16 },

    #[error("undecodable event: {0}")]
    Decode(String),

    #[error("no heartbeat within {secs}s")]
    HeartbeatTimeout { secs: u64 },

    #[error("stream closed by server")]
    Closed,
}
