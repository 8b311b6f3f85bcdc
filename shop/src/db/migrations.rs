// petalcart/src/db/migrations.rs

//! Versioned schema migrations with a ledger table.
//!
//! Each migration's statements and its ledger row commit in one transaction,
//! so a failure part way through leaves neither the schema change nor the
//! ledger entry behind. Statements are written with a `{schema}` placeholder
//! that is replaced by the quoted, validated schema name.

use crate::db::{qualified, Database, CUSTOM_TABLE, LEDGER_TABLE, PRODUCTS_TABLE};
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, info, instrument, warn};

/// Key for `pg_advisory_xact_lock`, serializing concurrent runners.
const MIGRATION_LOCK_KEY: i64 = 0x5045_5441_4c43;

#[derive(Debug, Clone, Copy)]
pub struct Migration {
  pub version: i64,
  pub name: &'static str,
  pub up: &'static [&'static str],
  pub down: &'static [&'static str],
}

pub static MIGRATIONS: &[Migration] = &[
  Migration {
    version: 1,
    name: "create_catalog_tables",
    up: &[
      "CREATE TABLE IF NOT EXISTS {schema}.products (
         id SERIAL PRIMARY KEY,
         name TEXT NOT NULL,
         price INTEGER NOT NULL,
         stock_quantity INTEGER NOT NULL DEFAULT 0,
         in_stock BOOLEAN NOT NULL DEFAULT TRUE,
         main_category TEXT,
         subcategory TEXT,
         image_url TEXT,
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
       )",
      "CREATE TABLE IF NOT EXISTS {schema}.custom (
         id SERIAL PRIMARY KEY,
         message TEXT,
         created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
       )",
    ],
    down: &["DROP TABLE IF EXISTS {schema}.custom", "DROP TABLE IF EXISTS {schema}.products"],
  },
  Migration {
    version: 2,
    name: "product_discount_columns",
    up: &[
      "ALTER TABLE {schema}.products
         ADD COLUMN IF NOT EXISTS original_price INTEGER,
         ADD COLUMN IF NOT EXISTS discount_percentage INTEGER DEFAULT 0,
         ADD COLUMN IF NOT EXISTS discount_amount INTEGER DEFAULT 0",
      "UPDATE {schema}.products SET original_price = price WHERE original_price IS NULL",
      "UPDATE {schema}.products SET discount_percentage = 0 WHERE discount_percentage IS NULL",
      "UPDATE {schema}.products SET discount_amount = 0 WHERE discount_amount IS NULL",
    ],
    down: &["ALTER TABLE {schema}.products
         DROP COLUMN IF EXISTS discount_amount,
         DROP COLUMN IF EXISTS discount_percentage,
         DROP COLUMN IF EXISTS original_price"],
  },
  Migration {
    version: 3,
    name: "custom_request_contact_columns",
    up: &["ALTER TABLE {schema}.custom
         ADD COLUMN IF NOT EXISTS user_name TEXT,
         ADD COLUMN IF NOT EXISTS user_email TEXT,
         ADD COLUMN IF NOT EXISTS user_phone TEXT"],
    down: &["ALTER TABLE {schema}.custom
         DROP COLUMN IF EXISTS user_phone,
         DROP COLUMN IF EXISTS user_email,
         DROP COLUMN IF EXISTS user_name"],
  },
];

/// A migration and, if applied, when.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
  pub version: i64,
  pub name: String,
  pub applied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow)]
struct LedgerRow {
  version: i64,
  name: String,
  applied_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ColumnInfo {
  pub column_name: String,
  pub data_type: String,
  pub is_nullable: String,
  pub column_default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProductAggregates {
  pub total: i64,
  pub discounted: i64,
  pub null_original_price: i64,
  pub null_discount_percentage: i64,
  pub null_discount_amount: i64,
}

/// Result of [`Migrator::verify`].
#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
  pub products: Vec<ColumnInfo>,
  pub custom: Vec<ColumnInfo>,
  /// `None` until the discount columns exist.
  pub aggregates: Option<ProductAggregates>,
}

impl SchemaReport {
  pub fn has_product_column(&self, name: &str) -> bool {
    self.products.iter().any(|c| c.column_name == name)
  }

  pub fn has_custom_column(&self, name: &str) -> bool {
    self.custom.iter().any(|c| c.column_name == name)
  }
}

/// Checks that versions are positive and strictly increasing and that every
/// migration has a name and statements in both directions.
pub fn validate_definitions(migrations: &[Migration]) -> Result<()> {
  let mut previous = 0;
  for m in migrations {
    if m.version <= previous {
      return Err(AppError::Migration(format!(
        "migration versions must be strictly increasing (found {} after {})",
        m.version, previous
      )));
    }
    if m.name.trim().is_empty() || m.up.is_empty() || m.down.is_empty() {
      return Err(AppError::Migration(format!(
        "migration {} needs a name and both up and down statements",
        m.version
      )));
    }
    previous = m.version;
  }
  Ok(())
}

/// Substitutes the quoted schema for `{schema}`.
pub fn render(statement: &str, schema: &str) -> String {
  statement.replace("{schema}", &format!("\"{}\"", schema))
}

pub struct Migrator<'a> {
  db: &'a Database,
  migrations: &'static [Migration],
}

impl<'a> Migrator<'a> {
  pub fn new(db: &'a Database) -> Result<Self> {
    Self::with_migrations(db, MIGRATIONS)
  }

  pub fn with_migrations(db: &'a Database, migrations: &'static [Migration]) -> Result<Self> {
    validate_definitions(migrations)?;
    Ok(Self { db, migrations })
  }

  fn ledger(&self) -> String {
    self.db.table(LEDGER_TABLE)
  }

  fn find(&self, version: i64) -> Result<&'static Migration> {
    self
      .migrations
      .iter()
      .find(|m| m.version == version)
      .ok_or_else(|| AppError::Migration(format!("unknown migration version {}", version)))
  }

  /// Creates the schema and the ledger table when missing.
  #[instrument(name = "migrations::ensure_ledger", skip(self), fields(schema = %self.db.schema()), err(Display))]
  pub async fn ensure_ledger(&self) -> Result<()> {
    let create_schema = format!("CREATE SCHEMA IF NOT EXISTS \"{}\"", self.db.schema());
    sqlx::query(&create_schema).execute(self.db.pool()).await?;
    let create_ledger = format!(
      "CREATE TABLE IF NOT EXISTS {} (
         version BIGINT PRIMARY KEY,
         name TEXT NOT NULL,
         applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
       )",
      self.ledger()
    );
    sqlx::query(&create_ledger).execute(self.db.pool()).await?;
    Ok(())
  }

  async fn applied(&self) -> Result<Vec<LedgerRow>> {
    let sql = format!("SELECT version, name, applied_at FROM {} ORDER BY version ASC", self.ledger());
    Ok(sqlx::query_as::<_, LedgerRow>(&sql).fetch_all(self.db.pool()).await?)
  }

  /// Every known migration with its applied time, in version order.
  #[instrument(name = "migrations::status", skip(self), err(Display))]
  pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
    self.ensure_ledger().await?;
    let applied = self.applied().await?;
    let mut statuses: Vec<MigrationStatus> = self
      .migrations
      .iter()
      .map(|m| MigrationStatus {
        version: m.version,
        name: m.name.to_string(),
        applied_at: applied.iter().find(|row| row.version == m.version).map(|row| row.applied_at),
      })
      .collect();
    for row in applied.iter().filter(|row| self.find(row.version).is_err()) {
      warn!(version = row.version, name = %row.name, "Ledger lists a migration this build does not know.");
      statuses.push(MigrationStatus {
        version: row.version,
        name: row.name.clone(),
        applied_at: Some(row.applied_at),
      });
    }
    Ok(statuses)
  }

  /// Applies every pending migration in order and returns the versions applied.
  #[instrument(name = "migrations::up", skip(self), fields(schema = %self.db.schema()), err(Display))]
  pub async fn up(&self) -> Result<Vec<i64>> {
    self.ensure_ledger().await?;
    let applied = self.applied().await?;
    let mut newly_applied = Vec::new();
    for migration in self.migrations {
      if applied.iter().any(|row| row.version == migration.version) {
        continue;
      }
      if self.apply(migration).await? {
        newly_applied.push(migration.version);
      }
    }
    if newly_applied.is_empty() {
      info!("Schema is up to date.");
    }
    Ok(newly_applied)
  }

  /// Reverts the `steps` most recently applied migrations, newest first.
  #[instrument(name = "migrations::down", skip(self), fields(schema = %self.db.schema()), err(Display))]
  pub async fn down(&self, steps: usize) -> Result<Vec<i64>> {
    self.ensure_ledger().await?;
    let applied = self.applied().await?;
    let mut reverted = Vec::new();
    for row in applied.iter().rev().take(steps) {
      let migration = self.find(row.version)?;
      self.revert(migration).await?;
      reverted.push(migration.version);
    }
    Ok(reverted)
  }

  /// Runs an applied migration's `up` statements again without touching the ledger.
  ///
  /// The statements are idempotent, so this only backfills rows that slipped in
  /// with nulls since the migration first ran.
  #[instrument(name = "migrations::rerun", skip(self), err(Display))]
  pub async fn rerun(&self, version: i64) -> Result<()> {
    let migration = self.find(version)?;
    self.ensure_ledger().await?;
    let mut tx = self.begin_locked().await?;
    if !self.is_recorded(&mut tx, version).await? {
      return Err(AppError::Migration(format!(
        "migration {} ({}) has not been applied; use `migrate up`",
        migration.version, migration.name
      )));
    }
    self.execute_all(&mut tx, migration, migration.up).await?;
    tx.commit().await?;
    info!(version, name = migration.name, "Migration statements re-run.");
    Ok(())
  }

  async fn begin_locked(&self) -> Result<Transaction<'static, Postgres>> {
    let mut tx = self.db.pool().begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
      .bind(MIGRATION_LOCK_KEY)
      .execute(&mut *tx)
      .await?;
    Ok(tx)
  }

  async fn is_recorded(&self, tx: &mut Transaction<'static, Postgres>, version: i64) -> Result<bool> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE version = $1)", self.ledger());
    Ok(sqlx::query_scalar::<_, bool>(&sql).bind(version).fetch_one(&mut **tx).await?)
  }

  async fn execute_all(
    &self,
    tx: &mut Transaction<'static, Postgres>,
    migration: &Migration,
    statements: &[&str],
  ) -> Result<()> {
    for statement in statements {
      let sql = render(statement, self.db.schema());
      sqlx::query(&sql).execute(&mut **tx).await.map_err(|e| {
        AppError::Migration(format!(
          "migration {} ({}) failed: {}",
          migration.version, migration.name, e
        ))
      })?;
    }
    Ok(())
  }

  /// Returns `false` when another runner recorded the migration first.
  async fn apply(&self, migration: &Migration) -> Result<bool> {
    let mut tx = self.begin_locked().await?;
    if self.is_recorded(&mut tx, migration.version).await? {
      debug!(version = migration.version, "Migration applied concurrently; skipping.");
      return Ok(false);
    }
    info!(version = migration.version, name = migration.name, "Applying migration.");
    self.execute_all(&mut tx, migration, migration.up).await?;
    let record = format!(
      "INSERT INTO {} (version, name) VALUES ($1, $2) ON CONFLICT (version) DO NOTHING",
      self.ledger()
    );
    sqlx::query(&record)
      .bind(migration.version)
      .bind(migration.name)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(true)
  }

  async fn revert(&self, migration: &Migration) -> Result<()> {
    info!(version = migration.version, name = migration.name, "Reverting migration.");
    let mut tx = self.begin_locked().await?;
    self.execute_all(&mut tx, migration, migration.down).await?;
    let forget = format!("DELETE FROM {} WHERE version = $1", self.ledger());
    sqlx::query(&forget).bind(migration.version).execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
  }

  /// Reads back the column sets of both tables plus product aggregates.
  #[instrument(name = "migrations::verify", skip(self), err(Display))]
  pub async fn verify(&self) -> Result<SchemaReport> {
    let products = self.columns(PRODUCTS_TABLE).await?;
    let custom = self.columns(CUSTOM_TABLE).await?;
    let mut report = SchemaReport {
      products,
      custom,
      aggregates: None,
    };

    let discount_columns = ["original_price", "discount_percentage", "discount_amount"];
    if discount_columns.iter().all(|c| report.has_product_column(c)) {
      let sql = format!(
        "SELECT
           COUNT(*) AS total,
           COUNT(*) FILTER (WHERE discount_percentage > 0 OR discount_amount > 0) AS discounted,
           COUNT(*) FILTER (WHERE original_price IS NULL) AS null_original_price,
           COUNT(*) FILTER (WHERE discount_percentage IS NULL) AS null_discount_percentage,
           COUNT(*) FILTER (WHERE discount_amount IS NULL) AS null_discount_amount
         FROM {}",
        qualified(self.db.schema(), PRODUCTS_TABLE)
      );
      report.aggregates = Some(sqlx::query_as::<_, ProductAggregates>(&sql).fetch_one(self.db.pool()).await?);
    }
    Ok(report)
  }

  async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = sqlx::query_as::<_, ColumnInfo>(
      "SELECT column_name::text AS column_name,
              data_type::text AS data_type,
              is_nullable::text AS is_nullable,
              column_default::text AS column_default
       FROM information_schema.columns
       WHERE table_schema = $1 AND table_name = $2
       ORDER BY ordinal_position",
    )
    .bind(self.db.schema())
    .bind(table)
    .fetch_all(self.db.pool())
    .await?;
    Ok(rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn shipped_migrations_are_well_formed() {
    validate_definitions(MIGRATIONS).unwrap();
    for m in MIGRATIONS {
      for stmt in m.up.iter().chain(m.down.iter()) {
        assert!(stmt.contains("{schema}."), "migration {} has an unqualified statement", m.version);
      }
    }
  }

  #[test]
  fn column_additions_are_idempotent_statements() {
    for m in MIGRATIONS {
      for stmt in m.up {
        if stmt.contains("ADD COLUMN") {
          assert_eq!(
            stmt.matches("ADD COLUMN").count(),
            stmt.matches("ADD COLUMN IF NOT EXISTS").count()
          );
        }
      }
    }
  }

  #[test]
  fn out_of_order_versions_are_rejected() {
    static BAD: &[Migration] = &[
      Migration {
        version: 2,
        name: "b",
        up: &["SELECT 1"],
        down: &["SELECT 1"],
      },
      Migration {
        version: 2,
        name: "c",
        up: &["SELECT 1"],
        down: &["SELECT 1"],
      },
    ];
    assert!(matches!(validate_definitions(BAD), Err(AppError::Migration(_))));

    static NO_DOWN: &[Migration] = &[Migration {
      version: 1,
      name: "a",
      up: &["SELECT 1"],
      down: &[],
    }];
    assert!(validate_definitions(NO_DOWN).is_err());
  }

  #[test]
  fn render_quotes_the_schema() {
    assert_eq!(
      render("UPDATE {schema}.products SET x = 1", "flowers"),
      "UPDATE \"flowers\".products SET x = 1"
    );
  }
}
