// petalcart/src/config.rs

use crate::errors::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Whether the server proxies the frontend bundler or serves built assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
  Development,
  Production,
}

/// Credentials for the hosted payment gateway.
#[derive(Clone)]
pub struct GatewayCredentials {
  pub key_id: String,
  pub key_secret: String,
}

impl std::fmt::Debug for GatewayCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GatewayCredentials")
      .field("key_id", &self.key_id)
      .field("key_secret", &"[REDACTED]")
      .finish()
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_schema: String,
  pub db_max_connections: u32,
  pub db_acquire_timeout: Duration,

  pub app_env: AppEnv,
  pub vite_dev_url: String,
  pub static_dir: PathBuf,

  /// `None` selects the in-process mock gateway.
  pub gateway: Option<GatewayCredentials>,
  pub gateway_base_url: String,

  /// `None` selects the in-process mock mailer.
  pub email_api_key: Option<String>,
  pub email_base_url: String,
  pub email_sender: String,
  pub email_sender_name: String,
  pub admin_email: String,

  pub http_timeout: Duration,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("db_schema", &self.db_schema)
      .field("db_max_connections", &self.db_max_connections)
      .field("app_env", &self.app_env)
      .field("vite_dev_url", &self.vite_dev_url)
      .field("static_dir", &self.static_dir)
      .field("gateway", &self.gateway)
      .field("email_api_key", &self.email_api_key.as_ref().map(|_| "[REDACTED]"))
      .field("email_sender", &self.email_sender)
      .field("admin_email", &self.admin_email)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds the configuration from any key/value source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_num::<u16>("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;
    let database_url =
      get("DATABASE_URL").ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;

    let db_schema = get_or("DB_SCHEMA", "public");
    crate::db::validate_identifier(&db_schema)?;
    let db_max_connections = parse_num::<u32>("DB_MAX_CONNECTIONS", &get_or("DB_MAX_CONNECTIONS", "5"))?;
    if db_max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    let db_acquire_timeout =
      Duration::from_secs(parse_num::<u64>("DB_ACQUIRE_TIMEOUT_SECS", &get_or("DB_ACQUIRE_TIMEOUT_SECS", "5"))?);

    let app_env = match get_or("APP_ENV", "production").to_ascii_lowercase().as_str() {
      "development" | "dev" => AppEnv::Development,
      "production" | "prod" => AppEnv::Production,
      other => return Err(AppError::Config(format!("Invalid APP_ENV value: {}", other))),
    };
    let vite_dev_url = get_or("VITE_DEV_URL", "http://localhost:5173")
      .trim_end_matches('/')
      .to_string();
    let default_static = match app_env {
      AppEnv::Development => "client",
      AppEnv::Production => "client/dist",
    };
    let static_dir = PathBuf::from(get_or("STATIC_DIR", default_static));

    let gateway = match (get("RAZORPAY_KEY_ID"), get("RAZORPAY_KEY_SECRET")) {
      (Some(key_id), Some(key_secret)) => Some(GatewayCredentials { key_id, key_secret }),
      (None, None) => None,
      _ => {
        return Err(AppError::Config(
          "RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET must be set together".to_string(),
        ))
      }
    };
    let gateway_base_url = get_or("RAZORPAY_BASE_URL", "https://api.razorpay.com")
      .trim_end_matches('/')
      .to_string();

    let email_api_key = get("BREVO_API_KEY");
    let email_base_url = get_or("BREVO_BASE_URL", "https://api.brevo.com")
      .trim_end_matches('/')
      .to_string();
    let email_sender = get_or("EMAIL_SENDER", "orders@petalcart.local");
    let email_sender_name = get_or("EMAIL_SENDER_NAME", "PetalCart");
    let admin_email = get_or("ADMIN_EMAIL", "admin@petalcart.local");

    let http_timeout = Duration::from_secs(parse_num::<u64>("HTTP_TIMEOUT_SECS", &get_or("HTTP_TIMEOUT_SECS", "15"))?);

    let config = Self {
      server_host,
      server_port,
      database_url,
      db_schema,
      db_max_connections,
      db_acquire_timeout,
      app_env,
      vite_dev_url,
      static_dir,
      gateway,
      gateway_base_url,
      email_api_key,
      email_base_url,
      email_sender,
      email_sender_name,
      admin_email,
      http_timeout,
    };
    tracing::info!(config = ?config, "Application configuration loaded.");
    Ok(config)
  }

  pub fn is_development(&self) -> bool {
    self.app_env == AppEnv::Development
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_num<T>(key: &str, raw: &str) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(|key| map.get(key).cloned())
  }

  #[test]
  fn defaults_apply_when_only_database_url_is_set() {
    let cfg = config_from(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
    assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
    assert_eq!(cfg.db_schema, "public");
    assert_eq!(cfg.db_max_connections, 5);
    assert_eq!(cfg.app_env, AppEnv::Production);
    assert_eq!(cfg.static_dir, PathBuf::from("client/dist"));
    assert!(cfg.gateway.is_none());
    assert!(cfg.email_api_key.is_none());
    assert_eq!(cfg.http_timeout, Duration::from_secs(15));
  }

  #[test]
  fn database_url_is_required() {
    assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
  }

  #[test]
  fn development_mode_changes_static_default() {
    let cfg = config_from(&[
      ("DATABASE_URL", "postgres://localhost/shop"),
      ("APP_ENV", "development"),
      ("VITE_DEV_URL", "http://127.0.0.1:5173/"),
    ])
    .unwrap();
    assert!(cfg.is_development());
    assert_eq!(cfg.static_dir, PathBuf::from("client"));
    assert_eq!(cfg.vite_dev_url, "http://127.0.0.1:5173");
  }

  #[test]
  fn invalid_values_are_config_errors() {
    let bad_port = config_from(&[("DATABASE_URL", "postgres://x"), ("SERVER_PORT", "eighty")]);
    assert!(matches!(bad_port, Err(AppError::Config(m)) if m.contains("SERVER_PORT")));

    let bad_schema = config_from(&[("DATABASE_URL", "postgres://x"), ("DB_SCHEMA", "shop; drop table")]);
    assert!(matches!(bad_schema, Err(AppError::Config(_))));

    let half_gateway = config_from(&[("DATABASE_URL", "postgres://x"), ("RAZORPAY_KEY_ID", "rzp_test")]);
    assert!(matches!(half_gateway, Err(AppError::Config(_))));
  }

  #[test]
  fn debug_output_redacts_secrets() {
    let cfg = config_from(&[
      ("DATABASE_URL", "postgres://user:hunter2@db/shop"),
      ("RAZORPAY_KEY_ID", "rzp_test_key"),
      ("RAZORPAY_KEY_SECRET", "very-secret"),
      ("BREVO_API_KEY", "xkeysib-123"),
    ])
    .unwrap();
    let rendered = format!("{:?}", cfg);
    assert!(!rendered.contains("hunter2"));
    assert!(!rendered.contains("very-secret"));
    assert!(!rendered.contains("xkeysib-123"));
    assert!(rendered.contains("rzp_test_key"));
  }
}
