use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rately::auth::{CredentialHasher, SessionStore};
use rately::config::ServerConfig;
use rately::db::{Db, SqliteDb};
use rately::server::{AppState, create_router};
use rately::types::{Role, User};

#[derive(Parser)]
#[command(name = "rately")]
#[command(about = "A store rating server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Session lifetime in seconds
        #[arg(long, default_value = "86400")]
        session_ttl_secs: u64,

        /// Interval between session sweeps in seconds
        #[arg(long, default_value = "300")]
        sweep_interval_secs: u64,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and first admin account)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email for the admin account
        #[arg(long)]
        email: Option<String>,

        /// Password for the admin account
        #[arg(long)]
        password: Option<String>,

        /// Skip interactive prompts (requires --email and --password)
        #[arg(long)]
        non_interactive: bool,
    },
}

fn run_init(
    data_dir: String,
    email: Option<String>,
    password: Option<String>,
    non_interactive: bool,
) -> anyhow::Result<()> {
    let data_path: std::path::PathBuf = data_dir.into();
    fs::create_dir_all(&data_path)?;

    let db_path = data_path.join("rately.db");
    let db = SqliteDb::new(&db_path)?;
    db.initialize()?;

    if db.has_admin_user()? {
        bail!("Server already initialized. An admin account exists.");
    }

    let email = match email {
        Some(email) => email,
        None if non_interactive => bail!("--email is required with --non-interactive"),
        None => inquire::Text::new("Admin email:")
            .with_validator(|input: &str| {
                if input.contains('@') {
                    Ok(inquire::validator::Validation::Valid)
                } else {
                    Err("Not a valid email address".into())
                }
            })
            .prompt()?,
    };

    let password = match password {
        Some(password) => password,
        None if non_interactive => bail!("--password is required with --non-interactive"),
        None => inquire::Password::new("Admin password:").prompt()?,
    };

    let hasher = CredentialHasher::new();
    let hash = hasher.hash(&password)?;

    let now = Utc::now();
    let admin = User {
        id: Uuid::new_v4().to_string(),
        name: "Administrator".to_string(),
        email: email.clone(),
        address: String::new(),
        credential_hash: Some(hash),
        role: Role::Admin,
        created_at: now,
        updated_at: now,
    };

    db.create_user(&admin)?;

    println!();
    println!("========================================");
    println!("Created admin account '{email}'.");
    println!("Database written to: {}", db_path.display());
    println!("========================================");
    println!();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("rately=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                email,
                password,
                non_interactive,
            } => {
                run_init(data_dir, email, password, non_interactive)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            session_ttl_secs,
            sweep_interval_secs,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                session_ttl: Duration::from_secs(session_ttl_secs),
                sweep_interval: Duration::from_secs(sweep_interval_secs),
            };

            let db = SqliteDb::new(config.db_path())?;
            db.initialize()?;
            if !db.has_admin_user()? {
                bail!(
                    "Server not initialized. Run 'rately admin init' first to create the database and admin account."
                );
            }

            let sessions = Arc::new(SessionStore::new());
            let sweeper = Arc::clone(&sessions).start_sweeper(config.sweep_interval);

            let state = Arc::new(AppState::new(
                Arc::new(db),
                Arc::clone(&sessions),
                config.session_ttl,
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;

            sweeper.stop();
        }
    }

    Ok(())
}
