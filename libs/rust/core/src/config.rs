//! Environment-driven configuration: defaults, then an optional config
//! file, then `SENTINEL_*` environment overrides.

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub secret_key: String,
    pub debug: bool,
    pub model_path: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: String,
    pub cors_origins: String,
}

/// Layered lookup: built-in defaults, the file named by
/// `SENTINEL_CONFIG_FILE` when set, then environment variables such as
/// `SENTINEL_MODEL_PATH` or `SENTINEL_PORT`.
pub fn load_config() -> Result<GatewayConfig> {
    let mut builder = config::Config::builder()
        .set_default("secret_key", "sentinel-dev-secret")?
        .set_default("debug", false)?
        .set_default("model_path", "models/classifier.onnx")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 5000_i64)?
        .set_default("log_level", "info")?
        .set_default("log_file", "inference-gateway.log")?
        .set_default("cors_origins", "*")?;
    if let Ok(file) = std::env::var("SENTINEL_CONFIG_FILE") {
        builder = builder.add_source(config::File::with_name(&file).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix("SENTINEL").separator("__"));
    Ok(builder.build()?.try_deserialize()?)
}
