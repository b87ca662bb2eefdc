//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use tally_core::AppConfig;

pub async fn cmd_serve(
    mut config: AppConfig,
    host: &str,
    port: u16,
    ledger: Option<PathBuf>,
    static_dir: Option<&Path>,
    allowed_origins: Vec<String>,
) -> Result<()> {
    if ledger.is_some() {
        config.ledger.path = ledger;
    }

    println!("🚀 Starting Tally web server...");
    println!("   Listening: http://{}:{}", host, port);
    match &config.ledger.path {
        Some(path) => println!("   Ledger: {}", path.display()),
        None => println!("   Ledger: in memory (lost on exit)"),
    }
    println!("   Principal: {}", config.ledger.principal);
    println!("   OCR backend: {}", config.ocr.backend.as_str());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let server = tally_server::ServerConfig { allowed_origins };
    let state =
        tally_server::AppState::from_config(config, server).context("Failed to set up server state")?;

    let static_dir_str = static_dir
        .map(|p| p.to_str().context("Static directory path must be valid UTF-8"))
        .transpose()?;
    tally_server::serve_with_config(state, host, port, static_dir_str).await?;

    Ok(())
}
