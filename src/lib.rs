pub mod api;
pub mod error;
pub mod models;
pub mod services;

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::{AppState, TokenResolver};
use services::config_store::{AppConfig, ConfigStore};
use services::detection::{Analyzer, ScoreRequestDispatcher};
use services::history_store::{HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
use services::providers::ProviderClient;

static PROCESS_START: OnceLock<Instant> = OnceLock::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_PREFIX: &str = "textlens_";
const LOG_FILES_KEPT: usize = 30;

fn startup_elapsed_ms() -> u128 {
    PROCESS_START
        .get()
        .map(|t| t.elapsed().as_millis())
        .unwrap_or(0)
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

/// Initialize logging: per-session log file plus console output
pub fn init_logging() {
    let disable_file_log = env_flag("TEXTLENS_DISABLE_FILE_LOG");
    let disable_cleanup = env_flag("TEXTLENS_DISABLE_LOG_CLEANUP");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if disable_file_log {
        init_console_only_logging(env_filter);
        info!("File logging disabled via TEXTLENS_DISABLE_FILE_LOG");
        return;
    }

    let logs_dir = match std::env::var("TEXTLENS_LOG_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => get_logs_dir(),
    };

    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Failed to create logs directory: {}", e);
        init_console_only_logging(env_filter);
        info!("Falling back to console-only logging (log dir not writable)");
        return;
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("{}{}.log", LOG_FILE_PREFIX, timestamp);

    // One file per session; writes go through a background worker.
    let file_appender = rolling::never(&logs_dir, &log_filename);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(file_guard);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    info!("=== TextLens Started ===");
    info!("Log file: {}/{}", logs_dir.display(), log_filename);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    if !disable_cleanup {
        std::thread::spawn(move || {
            cleanup_old_logs(&logs_dir, LOG_FILES_KEPT);
        });
    }
}

fn get_logs_dir() -> PathBuf {
    #[cfg(debug_assertions)]
    {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("logs")
    }

    #[cfg(not(debug_assertions))]
    {
        if let Some(data_dir) = dirs::data_local_dir() {
            return data_dir.join("textlens").join("logs");
        }
        PathBuf::from("logs")
    }
}

fn cleanup_old_logs(logs_dir: &Path, keep: usize) {
    let mut entries: Vec<_> = match fs::read_dir(logs_dir) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => return,
    };

    entries.retain(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log")
    });

    if entries.len() <= keep {
        return;
    }

    entries.sort_by_key(|e| {
        e.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    });

    let remove_count = entries.len().saturating_sub(keep);
    for entry in entries.into_iter().take(remove_count) {
        let _ = fs::remove_file(entry.path());
    }
}

fn init_console_only_logging(env_filter: EnvFilter) {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions))
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

/// Load the effective configuration (file + environment overrides).
pub fn load_config() -> anyhow::Result<AppConfig> {
    match ConfigStore::default_config_dir() {
        Some(dir) => {
            let store = ConfigStore::new(dir);
            let config = store
                .load_effective()
                .with_context(|| format!("loading {}", store.config_file().display()))?;
            Ok(config)
        }
        None => {
            let mut config = AppConfig::default();
            config.apply_env();
            Ok(config)
        }
    }
}

pub fn build_history_store(config: &AppConfig) -> Arc<dyn HistoryStore> {
    if config.history.in_memory {
        info!("[HISTORY] using in-memory history store");
        return Arc::new(MemoryHistoryStore::new());
    }
    let path = config.history.resolved_path();
    info!("[HISTORY] using history file {}", path.display());
    Arc::new(JsonFileHistoryStore::new(path))
}

pub fn build_analyzer(config: &AppConfig) -> anyhow::Result<Analyzer> {
    let settings = config.provider.settings();
    if settings.api_key.is_none() {
        // Not fatal: requests fail with a configuration error until a key is provided.
        warn!("[CONFIG] scoring API key not configured; analyses will be refused");
    }
    info!(url = %settings.url, model = %settings.model, "[CONFIG] scoring provider");

    let client = ProviderClient::new(settings).context("building HTTP client")?;
    let dispatcher = ScoreRequestDispatcher::new(Arc::new(client));
    Ok(Analyzer::new(dispatcher, build_history_store(config)))
}

pub fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let identities = TokenResolver::new(&config.access_tokens);
    if identities.is_empty() {
        warn!("[CONFIG] no access tokens configured; history endpoints will return 401");
    } else {
        info!(tokens = identities.len(), "[CONFIG] access tokens loaded");
    }
    Ok(AppState {
        analyzer: Arc::new(build_analyzer(config)?),
        identities: Arc::new(identities),
    })
}

/// Serve the HTTP API until the process is stopped.
pub async fn run() -> anyhow::Result<()> {
    PROCESS_START.get_or_init(Instant::now);

    let logging_t0 = Instant::now();
    init_logging();
    info!(
        startup_ms = startup_elapsed_ms(),
        logging_ms = logging_t0.elapsed().as_millis(),
        "logging.initialized"
    );

    let config = load_config()?;
    let state = build_state(&config)?;
    let app = api::router(state);

    let addr = config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!(startup_ms = startup_elapsed_ms(), "-- TextLens API listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("=== TextLens Exited ===");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("=== TextLens Shutting Down ===");
}
