use anyhow::Context;

use road_auth::hash_password;
use road_config::RoadConfig;
use road_core::entities::NewUser;
use road_db::service::RoadService;

use super::output;
use crate::cli::UserCreateArgs;

/// Create a user without going through the API. This is how the first admin
/// gets in.
pub async fn create(args: &UserCreateArgs, config: &RoadConfig) -> anyhow::Result<()> {
    let new = NewUser {
        email: args.email.clone(),
        name: args.name.clone(),
        role: args.role,
        password: args.password.clone(),
    };
    new.validate()?;
    let password_hash = hash_password(&new.password)?;

    let service = RoadService::from_config(&config.database)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;
    let user = service
        .create_user(None, &new, &password_hash)
        .await
        .with_context(|| format!("failed to create user {}", new.email))?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    output(&user)
}
