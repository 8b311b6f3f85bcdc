// petalcart/src/db/custom_requests.rs

use crate::db::{Database, CUSTOM_TABLE};
use crate::errors::Result;
use crate::models::{CustomRequest, NewCustomRequest};
use tracing::instrument;

const CUSTOM_COLUMNS: &str = "id, user_name, user_email, user_phone, message, created_at";

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

#[instrument(name = "custom_requests::insert", skip(db, request), err(Display))]
pub async fn insert(db: &Database, request: &NewCustomRequest) -> Result<CustomRequest> {
  let sql = format!(
    "INSERT INTO {} (user_name, user_email, user_phone, message) VALUES ($1, $2, $3, $4) RETURNING {}",
    db.table(CUSTOM_TABLE),
    CUSTOM_COLUMNS
  );
  let row = sqlx::query_as::<_, CustomRequest>(&sql)
    .bind(&request.user_name)
    .bind(&request.user_email)
    .bind(&request.user_phone)
    .bind(&request.message)
    .fetch_one(db.pool())
    .await?;
  tracing::info!(custom_request_id = row.id, "Custom request stored.");
  Ok(row)
}

/// Newest first.
#[instrument(name = "custom_requests::list_recent", skip(db), err(Display))]
pub async fn list_recent(db: &Database, limit: Option<i64>) -> Result<Vec<CustomRequest>> {
  let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
  let sql = format!(
    "SELECT {} FROM {} ORDER BY id DESC LIMIT $1",
    CUSTOM_COLUMNS,
    db.table(CUSTOM_TABLE)
  );
  let rows = sqlx::query_as::<_, CustomRequest>(&sql)
    .bind(limit)
    .fetch_all(db.pool())
    .await?;
  Ok(rows)
}
