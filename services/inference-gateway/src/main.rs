use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use sentinel_core::{init_tracing, load_config, OnnxArtifact, PredictionService};
use tracing::info;

mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = load_config()?;
    init_tracing("inference-gateway", &cfg)?;
    info!(
        target: "inference-gateway",
        debug = cfg.debug,
        host = %cfg.host,
        port = cfg.port,
        model_path = %cfg.model_path,
        "Starting inference-gateway service"
    );

    // A gateway without a model is useless: load failures abort startup.
    let artifact = OnnxArtifact::load(Path::new(&cfg.model_path))?;
    let service = Arc::new(PredictionService::new(Arc::new(artifact)));

    let app = routes::router(routes::AppState { service }, &cfg.cors_origins);
    let listener = tokio::net::TcpListener::bind((cfg.host.as_str(), cfg.port)).await?;
    info!(target: "inference-gateway", addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
