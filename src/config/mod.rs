//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Endpoints,
//! intervals, and identity live here; secrets (JWT signing key, metrics
//! credentials, factory API key) come from environment variables and are
//! never written to the TOML file.

pub mod loader;

use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup and validated before any task
/// is spawned.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Service identity and HTTP server settings.
  pub service: ServiceConfig,
  /// Token lifetime and seeded admin account.
  pub auth: AuthConfig,
  /// Metrics reporting pipeline.
  pub metrics: MetricsConfig,
  /// Pizza factory endpoint.
  pub factory: FactoryConfig,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
  /// API server bind address.
  #[serde(default = "default_bind_address")]
  pub bind_address: String,
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  /// Issued token lifetime in hours.
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours: u64,
  /// Email of the admin account seeded at startup.
  pub admin_email: String,
  /// Display name of the seeded admin.
  #[serde(default = "default_admin_name")]
  pub admin_name: String,
  /// Initial password of the seeded admin. Rotate after first login.
  pub admin_password: String,
}

/// Metrics reporting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable the collection/flush pipeline.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Remote time-series push endpoint URL.
  pub url: String,
  /// Source tag attached to every metric line.
  pub source: String,
  /// Collection/flush interval in seconds.
  #[serde(default = "default_metrics_interval")]
  pub interval_seconds: u64,
  /// Push request timeout in seconds.
  #[serde(default = "default_push_timeout")]
  pub timeout_seconds: u64,
}

/// Pizza factory endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FactoryConfig {
  /// Factory base URL.
  pub url: String,
  /// Fulfillment request timeout in seconds.
  #[serde(default = "default_factory_timeout")]
  pub timeout_seconds: u64,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_bind_address() -> String {
  "0.0.0.0:3000".to_string()
}

fn default_token_ttl_hours() -> u64 {
  24
}

fn default_admin_name() -> String {
  "service admin".to_string()
}

fn default_true() -> bool {
  true
}

fn default_metrics_interval() -> u64 {
  30
}

fn default_push_timeout() -> u64 {
  10
}

fn default_factory_timeout() -> u64 {
  30
}
