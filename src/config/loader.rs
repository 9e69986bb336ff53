//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters, and
//! providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    service = %config.service.name,
    bind = %config.service.bind_address,
    metrics_enabled = config.metrics.enabled,
    flush_interval_s = config.metrics.interval_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
fn validate_config(config: &AppConfig) -> Result<()> {
  // Service validation
  anyhow::ensure!(
    !config.service.name.is_empty(),
    "service name must not be empty"
  );
  config
    .service
    .bind_address
    .parse::<std::net::SocketAddr>()
    .with_context(|| {
      format!(
        "service bind_address is not a socket address: {}",
        config.service.bind_address
      )
    })?;

  // Auth validation
  anyhow::ensure!(
    config.auth.token_ttl_hours > 0,
    "auth token_ttl_hours must be positive"
  );
  anyhow::ensure!(
    config.auth.admin_email.contains('@'),
    "auth admin_email is not an email address: {}",
    config.auth.admin_email
  );
  anyhow::ensure!(
    !config.auth.admin_password.is_empty(),
    "auth admin_password must not be empty"
  );

  // Metrics validation
  if config.metrics.enabled {
    anyhow::ensure!(
      !config.metrics.url.is_empty(),
      "metrics url must not be empty when metrics are enabled"
    );
    anyhow::ensure!(
      !config.metrics.source.is_empty(),
      "metrics source tag must not be empty when metrics are enabled"
    );
  }
  anyhow::ensure!(
    config.metrics.interval_seconds > 0,
    "metrics interval_seconds must be positive, got {}",
    config.metrics.interval_seconds
  );

  // Factory validation
  anyhow::ensure!(
    !config.factory.url.is_empty(),
    "factory url must not be empty"
  );
  anyhow::ensure!(
    config.factory.timeout_seconds > 0,
    "factory timeout_seconds must be positive"
  );

  Ok(())
}
