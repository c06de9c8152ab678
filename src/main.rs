//! Tar pit server for automated crawlers.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zentinel_tarpit::content::lexicon;
use zentinel_tarpit::{server, ArchetypeRegistry, ConfigStore, Statistics, TarpitConfig, TarpitService};

#[derive(Parser, Debug)]
#[command(name = "zentinel-tarpit")]
#[command(author, version, about = "Deception server that traps automated crawlers")]
struct Args {
    /// Path to configuration file (JSON or YAML). Reloaded on SIGHUP.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to an archetype registry (JSON). Built-in archetypes when unset.
    #[arg(long)]
    archetypes: Option<PathBuf>,

    /// Listen address, overriding the configuration file
    #[arg(short, long)]
    listen: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(json: bool, level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let env_filter = EnvFilter::from_default_env()
        .add_directive(level.into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }
}

fn load_config(path: &Path) -> Result<TarpitConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(args.json_logs, &args.log_level);

    // Load configuration
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => TarpitConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }

    for theme in &config.targeting.content_themes {
        if !lexicon::is_known_theme(theme) {
            warn!(theme = %theme, "Unknown content theme, generic vocabulary will be used");
        }
    }

    let registry = match &args.archetypes {
        Some(path) => ArchetypeRegistry::load(path)?,
        None => ArchetypeRegistry::with_defaults(),
    };
    let archetype_count = registry.len();

    let store = Arc::new(ConfigStore::new(config.targeting.clone())?);
    let service = TarpitService::new(
        Arc::new(registry),
        Arc::clone(&store),
        Arc::new(Statistics::new()),
        &config.cache,
        config.debug_headers,
    );

    if let Some(path) = args.config {
        spawn_reload(path, store);
    }

    let app = server::router(Arc::new(service), config.server.status_path.as_deref());
    let listener = TcpListener::bind(&config.server.listen).await?;

    info!(
        listen = %config.server.listen,
        archetypes = archetype_count,
        targeted = ?config.targeting.targeted_archetypes,
        status_path = ?config.server.status_path,
        "Tar pit listening"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Tar pit stopped");
    Ok(())
}

/// Re-read the config file on SIGHUP and swap the targeting snapshot.
#[cfg(unix)]
fn spawn_reload(path: PathBuf, store: Arc<ConfigStore>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to install SIGHUP handler, reload disabled");
                return;
            }
        };

        while hangup.recv().await.is_some() {
            let reloaded = load_config(&path)
                .and_then(|c| store.replace(c.targeting).map_err(anyhow::Error::from));
            match reloaded {
                Ok(version) => info!(version, path = %path.display(), "Configuration reloaded"),
                Err(e) => warn!(error = %e, path = %path.display(), "Configuration reload rejected, keeping previous"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload(_path: PathBuf, _store: Arc<ConfigStore>) {}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
