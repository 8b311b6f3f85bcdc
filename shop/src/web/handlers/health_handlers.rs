// petalcart/src/web/handlers/health_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;

pub async fn health_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
      "status": "ok",
      "environment": if app_state.config.is_development() { "development" } else { "production" },
      "paymentGateway": app_state.payments.name(),
      "mailer": app_state.mailer.name(),
  }))
}

/// `SELECT 1` through the pool.
#[instrument(name = "handler::health_db", skip(app_state))]
pub async fn db_health_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  app_state.db.ping().await?;
  Ok(HttpResponse::Ok().json(json!({ "status": "ok", "database": "reachable" })))
}
