// petalcart/src/web/handlers/custom_request_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::db::custom_requests;
use crate::errors::AppError;
use crate::models::NewCustomRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListCustomRequestsQuery {
  pub limit: Option<i64>,
}

#[instrument(name = "handler::create_custom_request", skip(app_state, payload))]
pub async fn create_custom_request_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<NewCustomRequest>,
) -> Result<HttpResponse, AppError> {
  let request = payload.into_inner().normalized()?;
  let stored = custom_requests::insert(&app_state.db, &request).await?;
  Ok(HttpResponse::Created().json(json!({
      "success": true,
      "request": stored
  })))
}

#[instrument(name = "handler::list_custom_requests", skip(app_state))]
pub async fn list_custom_requests_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListCustomRequestsQuery>,
) -> Result<HttpResponse, AppError> {
  let requests = custom_requests::list_recent(&app_state.db, query.limit).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "count": requests.len(),
      "requests": requests
  })))
}
