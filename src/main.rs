use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use helmet_detection::cli::Args;
use helmet_detection::model::Detector;
use helmet_detection::service::{AppState, router};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // The service must not accept traffic without a loaded model.
    let detector = Detector::load(&args.model, args.input_size, args.iou, args.cuda)?;
    info!(model = %args.model.display(), input_size = args.input_size, "model loaded");

    let state = AppState {
        backend: Some(Arc::new(detector)),
        confidence_threshold: args.confidence,
        bucket_threshold: args.bucket_threshold,
    };
    let app = router(state);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "helmet detection service listening");
    axum::serve(listener, app).await?;

    Ok(())
}
