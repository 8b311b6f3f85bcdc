// petalcart/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use petalcart::config::AppConfig;
use petalcart::db::Database;
use petalcart::state::AppState;
use petalcart::{telemetry, web};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  telemetry::init_tracing("info");
  tracing::info!("Starting PetalCart server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let db = match Database::connect(&app_config).await {
    Ok(db) => db,
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let app_state = match AppState::from_config(app_config.clone(), db) {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build application state.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  if app_config.is_development() {
    tracing::info!(dev_server = %app_config.vite_dev_url, "Development mode: proxying frontend requests.");
  } else {
    tracing::info!(static_dir = %app_config.static_dir.display(), "Serving built frontend assets.");
  }

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  let shutdown_db = app_state.db.clone();
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  shutdown_db.close().await;
  Ok(())
}
