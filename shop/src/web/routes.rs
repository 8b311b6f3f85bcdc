// petalcart/src/web/routes.rs

use actix_web::web;

use crate::dev_assets;
use crate::errors::AppError;
use crate::web::handlers::{
  custom_request_handlers, health_handlers, notification_handlers, payment_handlers, product_handlers,
};

/// Malformed JSON bodies become the same 400 shape as validation failures.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(64 * 1024)
    .error_handler(|err, _req| AppError::Validation(format!("Invalid JSON body: {}", err)).into())
}

fn query_config() -> web::QueryConfig {
  web::QueryConfig::default()
    .error_handler(|err, _req| AppError::Validation(format!("Invalid query string: {}", err)).into())
}

fn path_config() -> web::PathConfig {
  web::PathConfig::default()
    .error_handler(|err, _req| AppError::Validation(format!("Invalid path parameter: {}", err)).into())
}

// Called from `main.rs` and the HTTP tests to configure the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(json_config())
    .app_data(query_config())
    .app_data(path_config())
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_handlers::health_handler))
        .route("/health/db", web::get().to(health_handlers::db_health_handler))
        .route("/categories", web::get().to(product_handlers::list_categories_handler))
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route(
              "/subcategory/{subcategory}",
              web::get().to(product_handlers::products_by_subcategory_handler),
            )
            .route(
              "/category/{category}",
              web::get().to(product_handlers::products_by_category_handler),
            )
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
        )
        .route(
          "/payment/create-order",
          web::post().to(payment_handlers::create_order_handler),
        )
        .route(
          "/orders/confirmation",
          web::post().to(notification_handlers::order_confirmation_handler),
        )
        .service(
          web::resource("/custom-requests")
            .route(web::get().to(custom_request_handlers::list_custom_requests_handler))
            .route(web::post().to(custom_request_handlers::create_custom_request_handler)),
        ),
    )
    .default_service(web::to(dev_assets::frontend_fallback));
}
