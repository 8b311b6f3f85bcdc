// petalcart/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::db::products;
use crate::errors::AppError;
use crate::models::{Product, ProductFilter};
use crate::state::AppState;

fn product_list(products: Vec<Product>) -> HttpResponse {
  HttpResponse::Ok().json(json!({
      "success": true,
      "count": products.len(),
      "products": products
  }))
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  filter: web::Query<ProductFilter>,
) -> Result<HttpResponse, AppError> {
  let found = products::list(&app_state.db, &filter).await?;
  info!(count = found.len(), "Products listed.");
  Ok(product_list(found))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %*path))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match products::get(&app_state.db, product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "product": product
    }))),
    None => {
      warn!(product_id, "Product not found.");
      Err(AppError::NotFound(format!("Product with ID {} not found.", product_id)))
    }
  }
}

#[instrument(name = "handler::products_by_subcategory", skip(app_state, path), fields(term = %path.as_str()))]
pub async fn products_by_subcategory_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let found = products::by_subcategory(&app_state.db, &path).await?;
  info!(count = found.len(), "Subcategory search finished.");
  Ok(product_list(found))
}

#[instrument(name = "handler::products_by_category", skip(app_state, path), fields(term = %path.as_str()))]
pub async fn products_by_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let found = products::by_main_category(&app_state.db, &path).await?;
  info!(count = found.len(), "Category search finished.");
  Ok(product_list(found))
}

#[instrument(name = "handler::list_categories", skip(app_state))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let categories = products::category_summary(&app_state.db).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "count": categories.len(),
      "categories": categories
  })))
}
