// petalcart/src/state.rs
use crate::config::AppConfig;
use crate::db::Database;
use crate::errors::{AppError, Result};
use crate::pipelines;
use crate::services::email::{self, EmailAddress, EmailSender};
use crate::services::payment::{self, PaymentGateway};
use petalflow::FlowRegistry;
use std::sync::Arc;

/// Everything a request handler needs, cloned into every actix worker.
#[derive(Clone)]
pub struct AppState {
  pub db: Database,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub payments: Arc<dyn PaymentGateway>,
  pub mailer: Arc<dyn EmailSender>,
  /// Client for the dev-server proxy.
  pub http: reqwest::Client,
}

impl AppState {
  /// Wires the given services together and registers every pipeline.
  pub fn new(
    config: Arc<AppConfig>,
    db: Database,
    payments: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn EmailSender>,
  ) -> Result<Self> {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows)?;
    let http = reqwest::Client::builder().timeout(config.http_timeout).build()?;
    Ok(Self {
      db,
      flows,
      config,
      payments,
      mailer,
      http,
    })
  }

  /// Picks real or mock integrations from the configuration.
  pub fn from_config(config: Arc<AppConfig>, db: Database) -> Result<Self> {
    let payments = payment::gateway_from_config(&config)?;
    let mailer = email::mailer_from_config(&config)?;
    tracing::info!(gateway = payments.name(), mailer = mailer.name(), "Integrations selected.");
    Self::new(config, db, payments, mailer)
  }

  /// The configured "from" address for outgoing mail.
  pub fn sender(&self) -> EmailAddress {
    EmailAddress::new(
      self.config.email_sender.clone(),
      Some(self.config.email_sender_name.clone()),
    )
  }
}
