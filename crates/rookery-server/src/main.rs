use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rookery_core::Rookery;
use rookery_crypto::{ENCRYPTION_KEY_ENV, MessageCipher};
use rookery_server::{ServerConfig, router, serve};
use rookery_store::Store;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(author, version, about = "rookery social backend")]
struct Cli {
    /// TOML config file. Flags below override its values.
    #[arg(long, global = true, env = "ROOKERY_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    listen: Option<SocketAddr>,
    /// SQLite database file.
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    #[arg(long, global = true)]
    token_ttl_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Print a fresh message encryption key.
    Keygen,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rookery_server=info,rookery_core=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Keygen) => {
            println!("{}", MessageCipher::generate_key_b64());
            Ok(())
        }
        Some(Command::Serve) | None => run(&cli).await,
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(ttl) = cli.token_ttl_secs {
        config.token_ttl_secs = ttl;
    }

    // A missing or malformed key is fatal.
    let cipher = MessageCipher::from_env()
        .with_context(|| format!("{ENCRYPTION_KEY_ENV} must hold a base64 32-byte key"))?;
    let store = Store::open(&config.database)
        .with_context(|| format!("failed to open database {}", config.database.display()))?;
    let rookery = Arc::new(Rookery::new(store, cipher, config.settings()));
    let app = router(rookery.clone()).layer(config.cors()?);

    // Periodically drop limiter keys that have gone quiet.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rookery.sweep_rate_limits();
        }
    });

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        database = %config.database.display(),
        token_ttl_secs = config.token_ttl_secs,
        "rookery-server listening"
    );

    serve(listener, app, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
}
