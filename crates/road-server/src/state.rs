//! Shared application state.

use std::sync::Arc;

use road_auth::JwtConfig;
use road_auth::password::DEFAULT_COST;
use road_config::RoadConfig;
use road_core::events::{EventKind, RealtimeEvent};
use road_db::service::RoadService;
use road_realtime::ConnectionRegistry;

/// Handles every request needs. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RoadService>,
    pub jwt: Arc<JwtConfig>,
    pub registry: Arc<ConnectionRegistry>,
    pub config: Arc<RoadConfig>,
    /// bcrypt work factor for passwords set through the API.
    pub password_cost: u32,
}

impl AppState {
    #[must_use]
    pub fn new(service: RoadService, config: RoadConfig) -> Self {
        let jwt = JwtConfig::from_config(&config.auth);
        let registry = ConnectionRegistry::new(config.realtime.heartbeat_interval());
        Self {
            service: Arc::new(service),
            jwt: Arc::new(jwt),
            registry: Arc::new(registry),
            config: Arc::new(config),
            password_cost: DEFAULT_COST,
        }
    }

    #[must_use]
    pub const fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Fire-and-forget broadcast. A failure is logged and otherwise ignored
    /// so the mutation that triggered it still succeeds.
    pub fn publish(&self, event: RealtimeEvent, project_id: Option<&str>) {
        let kind = event.kind;
        match self.registry.broadcast(event, project_id) {
            Ok(report) => {
                tracing::debug!(%kind, ?project_id, delivered = report.delivered, "event published");
            }
            Err(e) => tracing::warn!(%kind, error = %e, "event not published"),
        }
    }

    /// Serialize `payload` into an event of `kind` and publish it.
    pub fn publish_payload<T: serde::Serialize>(
        &self,
        kind: EventKind,
        payload: &T,
        project_id: Option<&str>,
    ) {
        match RealtimeEvent::with_payload(kind, payload) {
            Ok(event) => self.publish(event, project_id),
            Err(e) => tracing::warn!(%kind, error = %e, "event payload not serializable"),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("registry", &self.registry)
            .field("jwt", &self.jwt)
            .finish_non_exhaustive()
    }
}
