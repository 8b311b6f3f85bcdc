// petalcart/src/db/mod.rs

//! PostgreSQL access: the pooled `Database` handle plus one module per table.
//!
//! Every statement is plain parameterized SQL. Table names are qualified with
//! the configured schema, which is validated once and always quoted.

pub mod custom_requests;
pub mod migrations;
pub mod products;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

pub const PRODUCTS_TABLE: &str = "products";
pub const CUSTOM_TABLE: &str = "custom";
pub const LEDGER_TABLE: &str = "schema_migrations";

/// Pool plus the schema every query is qualified with.
#[derive(Debug, Clone)]
pub struct Database {
  pool: PgPool,
  schema: String,
}

impl Database {
  #[instrument(name = "db::connect", skip(config), fields(schema = %config.db_schema, max_connections = config.db_max_connections))]
  pub async fn connect(config: &AppConfig) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(config.db_max_connections)
      .acquire_timeout(config.db_acquire_timeout)
      .connect(&config.database_url)
      .await?;
    info!("Connected to the database.");
    Self::from_pool(pool, &config.db_schema)
  }

  /// Builds a handle without opening a connection; the first query connects.
  pub fn connect_lazy(config: &AppConfig) -> Result<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(config.db_max_connections)
      .acquire_timeout(config.db_acquire_timeout)
      .connect_lazy(&config.database_url)?;
    Self::from_pool(pool, &config.db_schema)
  }

  pub fn from_pool(pool: PgPool, schema: &str) -> Result<Self> {
    validate_identifier(schema)?;
    Ok(Self {
      pool,
      schema: schema.to_string(),
    })
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }

  pub fn schema(&self) -> &str {
    &self.schema
  }

  /// `"schema"."table"`, safe to splice into SQL text.
  pub fn table(&self, table: &str) -> String {
    qualified(&self.schema, table)
  }

  #[instrument(name = "db::ping", skip(self))]
  pub async fn ping(&self) -> Result<()> {
    sqlx::query("SELECT 1").execute(&self.pool).await?;
    Ok(())
  }

  /// Closes the pool; scripts call this right before exiting.
  pub async fn close(&self) {
    self.pool.close().await;
    info!("Database pool closed.");
  }
}

/// Accepts plain SQL identifiers only: `[A-Za-z_][A-Za-z0-9_]*`, at most 63 bytes.
pub fn validate_identifier(ident: &str) -> Result<()> {
  let mut chars = ident.chars();
  let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
  let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
  if !valid_start || !valid_rest || ident.len() > 63 {
    return Err(AppError::Config(format!("Invalid SQL identifier: '{}'", ident)));
  }
  Ok(())
}

pub(crate) fn qualified(schema: &str, table: &str) -> String {
  format!("\"{}\".\"{}\"", schema, table)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifiers_are_validated() {
    for ok in ["public", "shop_v2", "_staging", "A1"] {
      assert!(validate_identifier(ok).is_ok(), "{} should be accepted", ok);
    }
    let too_long = "s".repeat(64);
    for bad in ["", "1shop", "shop-v2", "shop;drop", "public\"", too_long.as_str()] {
      assert!(validate_identifier(bad).is_err(), "{:?} should be rejected", bad);
    }
  }

  #[test]
  fn tables_are_quoted_and_qualified() {
    assert_eq!(qualified("public", PRODUCTS_TABLE), "\"public\".\"products\"");
    assert_eq!(qualified("flowers", CUSTOM_TABLE), "\"flowers\".\"custom\"");
  }
}
