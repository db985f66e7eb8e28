use anyhow::{Context, Result};
use clap::Parser;
use neurovoice::{create_router, store, AppState, Config, ProcessAnalyzer, TransientStorage};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "neurovoice", about = "Voice tremor analysis service")]
struct Args {
    /// Config file path, without extension
    #[arg(long, default_value = "config/neurovoice")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Analyzer: {} {:?} (timeout {:?})",
        cfg.analyzer.program,
        cfg.analyzer.args,
        cfg.analyzer_timeout()
    );

    let storage = TransientStorage::new(&cfg.upload.temp_dir, cfg.upload.max_bytes)
        .context("Failed to prepare upload directory")?;
    let analyzer = Arc::new(ProcessAnalyzer::new(
        cfg.analyzer.program.clone(),
        cfg.analyzer.args.clone(),
        cfg.analyzer_timeout(),
    ));
    let sessions = store::open(&cfg.store).context("Failed to open session store")?;

    let state = AppState::new(storage, analyzer, sessions);
    let app = create_router(state);

    let addr = cfg.http.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
