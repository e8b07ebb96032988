pub mod migrate;
pub mod serve;
pub mod user;
pub mod watch;

use serde::Serialize;

use road_config::RoadConfig;

use crate::cli::{Commands, UserCommands};

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: Commands, config: RoadConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve::handle(&args, config).await,
        Commands::Migrate => migrate::handle(&config).await,
        Commands::User {
            action: UserCommands::Create(args),
        } => user::create(&args, &config).await,
        Commands::Watch(args) => watch::handle(&args, &config).await,
    }
}

/// Print a response as pretty JSON on stdout.
pub fn output<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
