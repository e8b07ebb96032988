use anyhow::Context;
use serde_json::json;

use road_config::RoadConfig;
use road_db::service::RoadService;

use super::output;

/// Opening the database applies every pending migration.
pub async fn handle(config: &RoadConfig) -> anyhow::Result<()> {
    let service = RoadService::from_config(&config.database)
        .await
        .with_context(|| format!("failed to migrate database at {}", config.database.path))?;
    let users = service.count_users().await?;
    output(&json!({
        "database": config.database.path,
        "migrated": true,
        "users": users,
    }))
}
