//! Transport abstraction for the realtime client.
//!
//! A transport opens one connection and hands back a stream of decoded
//! envelopes. Reconnection and heartbeat supervision live in
//! [`crate::client`], so every transport gets them for free. Transports
//! differ in what they can do, which they declare through
//! [`TransportCapabilities`].

use std::collections::VecDeque;
use std::future::Future;

use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::ACCEPT;

use road_core::events::RealtimeEvent;

use crate::error::ClientError;
use crate::sse::SseDecoder;

/// Path of the server's event stream endpoint.
pub const EVENTS_PATH: &str = "/api/realtime/events";

pub type EventStream = BoxStream<'static, Result<RealtimeEvent, ClientError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportCapabilities {
    /// The client can send messages upstream on the same connection.
    pub bidirectional: bool,
    /// The server emits `heartbeat` events, so silence means a dead peer.
    pub server_heartbeats: bool,
}

pub trait EventTransport: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> TransportCapabilities;

    /// Open one connection.
    fn connect(&self) -> impl Future<Output = Result<EventStream, ClientError>> + Send;
}

/// Server-Sent Events over HTTP.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    project_id: Option<String>,
}

impl SseTransport {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            project_id: None,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Only receive events scoped to this project.
    #[must_use]
    pub fn for_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    #[must_use]
    pub fn url(&self) -> String {
        match self.project_id {
            Some(ref project_id) => format!(
                "{}{EVENTS_PATH}?project_id={}",
                self.base_url,
                urlencoding::encode(project_id)
            ),
            None => format!("{}{EVENTS_PATH}", self.base_url),
        }
    }
}

impl EventTransport for SseTransport {
    fn name(&self) -> &'static str {
        "sse"
    }

    fn capabilities(&self) -> TransportCapabilities {
        TransportCapabilities {
            bidirectional: false,
            server_heartbeats: true,
        }
    }

    async fn connect(&self) -> Result<EventStream, ClientError> {
        let mut request = self
            .client
            .get(self.url())
            .header(ACCEPT, "text/event-stream");
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }
        tracing::debug!(url = %self.url(), "event stream opened");

        let events = futures::stream::unfold(
            (response, SseDecoder::new(), VecDeque::new()),
            |(mut response, mut decoder, mut pending)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (response, decoder, pending)));
                    }
                    match response.chunk().await {
                        Ok(Some(bytes)) => {
                            pending.extend(decoder.push(&bytes).iter().map(|f| f.decode()));
                        }
                        Ok(None) => return None,
                        Err(e) => {
                            return Some((Err(ClientError::Http(e)), (response, decoder, pending)));
                        }
                    }
                }
            },
        );
        Ok(events.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_project_scope() {
        let transport = SseTransport::new("http://localhost:3000/").for_project("prj a&b");
        assert_eq!(
            transport.url(),
            "http://localhost:3000/api/realtime/events?project_id=prj%20a%26b"
        );
        assert_eq!(
            SseTransport::new("http://h").url(),
            "http://h/api/realtime/events"
        );
    }

    #[test]
    fn sse_declares_heartbeats_but_no_upstream() {
        let caps = SseTransport::new("http://h").capabilities();
        assert!(caps.server_heartbeats);
        assert!(!caps.bidirectional);
    }
}
