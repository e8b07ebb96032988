use clap::{Args, Parser, Subcommand};

use road_core::enums::Role;

/// Top-level CLI parser for the `roadtrack` binary.
#[derive(Debug, Parser)]
#[command(name = "roadtrack", version, about = "Road construction progress tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Create or upgrade the database schema, then exit.
    Migrate,
    /// User management.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Follow a server's event stream and print each event as JSON.
    Watch(WatchArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Socket address to listen on (overrides `server.bind`).
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum UserCommands {
    /// Create a user directly in the database.
    Create(UserCreateArgs),
}

#[derive(Clone, Debug, Args)]
pub struct UserCreateArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub name: String,
    /// admin, manager, engineer, or viewer.
    #[arg(long, default_value = "viewer")]
    pub role: Role,
    #[arg(long)]
    pub password: String,
}

#[derive(Clone, Debug, Args)]
pub struct WatchArgs {
    /// Server base URL.
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    pub url: String,
    /// Bearer token from `POST /api/auth/login`.
    #[arg(long)]
    pub token: String,
    /// Only receive events scoped to this project.
    #[arg(long)]
    pub project: Option<String>,
    /// Print heartbeat events too.
    #[arg(long)]
    pub heartbeats: bool,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_bind_override() {
        let cli = Cli::try_parse_from(["roadtrack", "serve", "--bind", "0.0.0.0:8080"])
            .expect("cli should parse");
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn user_create_parses_role_case_insensitively() {
        let cli = Cli::try_parse_from([
            "roadtrack",
            "user",
            "create",
            "--email",
            "admin@roads.gov.pg",
            "--name",
            "Admin",
            "--role",
            "Admin",
            "--password",
            "correct-horse",
        ])
        .expect("cli should parse");
        let Commands::User {
            action: UserCommands::Create(args),
        } = cli.command
        else {
            panic!("expected user create");
        };
        assert_eq!(args.role, Role::Admin);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = Cli::try_parse_from([
            "roadtrack",
            "user",
            "create",
            "--email",
            "a@b.pg",
            "--name",
            "A",
            "--role",
            "overlord",
            "--password",
            "correct-horse",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["roadtrack", "migrate", "--verbose"]).expect("cli should parse");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Migrate));
    }
}
