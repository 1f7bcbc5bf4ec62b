use std::sync::Arc;

use anyhow::{Context, Result};
use labreport::config::{self, Config};
use labreport::store::{MemoryReportStore, StaticTokens};
use labreport::web::{self, AppState};
use labreport::{Analyzer, KnowledgeBase, TextExtractor};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = Config::from_env();

    let kb = KnowledgeBase::load(
        config.ranges_path.as_deref(),
        config.specialties_path.as_deref(),
        config.symptoms_path.as_deref(),
    )
    .context("Failed to load reference tables")?;
    let analyzer = Analyzer::new(kb).context("Failed to build parameter patterns")?;

    // Images and scanned PDFs need OCR; everything else works without it
    let ocr = match labreport::models::load_ocr_engine(&config.detection_model, &config.recognition_model) {
        Ok(engine) => Some(engine),
        Err(e) => {
            tracing::warn!(error = %e, "OCR models unavailable, image uploads will yield no text");
            None
        }
    };

    let tokens = StaticTokens::parse(&config.tokens);
    if tokens.is_empty() {
        tracing::info!("no API tokens configured, uploads will not be stored");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;

    let state = Arc::new(AppState {
        analyzer,
        extractor: TextExtractor::new(ocr),
        store: Arc::new(MemoryReportStore::new()),
        auth: Arc::new(tokens),
        upload_dir: config.upload_dir.clone(),
    });

    let app = web::router(state, config.body_limit);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
