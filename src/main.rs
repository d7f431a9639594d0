use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use fincore::{
    api::{
        self, AppState,
        auth::{TokenSigner, ttl_from_hours},
    },
    config::{
        AppConfig,
        database::{create_connection, create_tables, ensure_sqlite_dir},
    },
    errors::Result,
    logging,
};
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// fincore - personal-finance bookkeeping API
#[derive(Parser, Debug)]
#[command(name = "fincore", version, about)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "fincore.toml", env = "FINCORE_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token for a user
    IssueToken {
        /// User the token identifies
        #[arg(long)]
        user_id: Uuid,
        /// Validity in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env before anything reads the environment
    dotenv().ok();

    let cli = Cli::parse();

    // 2. Resolve configuration (file, then env overrides)
    let config = AppConfig::load(&cli.config)?;

    // 3. Initialize tracing
    logging::init(&config.logging);

    match cli.command.unwrap_or(Command::Serve) {
        Command::IssueToken { user_id, ttl_hours } => {
            let signer = TokenSigner::new(&config.auth.token_secret);
            let token = signer.issue(user_id, ttl_from_hours(ttl_hours)?)?;
            println!("{token}");
            Ok(())
        }
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    // 4. Open the pool and make sure tables exist
    ensure_sqlite_dir(&config.database.url)?;
    let db = create_connection(&config.database)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Serve until Ctrl-C
    let state = AppState::new(db.clone(), TokenSigner::new(&config.auth.token_secret));
    let app = api::router(state, config.request_timeout());

    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Release the pool
    info!("Shutting down");
    db.close().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
