use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use road_auth::Permission;
use road_core::entities::Activity;
use road_core::enums::{ActivityAction, EntityType};
use road_db::repos::activity::ActivityFilter;

use super::non_blank;
use crate::error::ApiError;
use crate::extract::{ApiQuery, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/activity-log", get(list))
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    entity_type: Option<EntityType>,
    entity_id: Option<String>,
    user_id: Option<String>,
    action: Option<ActivityAction>,
    limit: Option<u32>,
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    user.require(Permission::Administer)?;
    let filter = ActivityFilter {
        entity_type: query.entity_type,
        entity_id: non_blank(query.entity_id),
        user_id: non_blank(query.user_id),
        action: query.action,
        limit: query.limit,
    };
    Ok(Json(state.service.query_activity(&filter).await?))
}
