use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Role;

/// Lightweight authenticated user identity for cross-crate passing.
///
/// Produced by `road-auth` from validated JWT claims, consumed by `road-server`
/// handlers and the realtime connection registry. Contains only data fields.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuthIdentity {
    /// User ID (`sub` claim).
    pub user_id: String,
    pub email: String,
    pub role: Role,
}
