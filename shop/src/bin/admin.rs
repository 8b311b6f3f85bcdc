// petalcart/src/bin/admin.rs

//! petalcart_admin: one-shot maintenance and diagnostic commands.
//!
//! Each command runs top to bottom, prints what it found, closes the pool and
//! exits non-zero on failure.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use petalcart::config::AppConfig;
use petalcart::db::migrations::{ColumnInfo, Migrator};
use petalcart::db::{products, Database};
use petalcart::models::{CreateOrderRequest, Product};
use petalcart::search::SynonymTable;
use petalcart::services::{email, payment, templates, EmailAddress, EmailMessage};
use petalcart::telemetry;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "petalcart_admin", version, about = "PetalCart maintenance and diagnostics")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Apply, revert or inspect schema migrations
  Migrate {
    #[command(subcommand)]
    action: MigrateAction,
  },
  /// Show the product/custom columns and flag inconsistent product rows
  CheckColumns,
  /// List every category/subcategory pair with its product count
  Categories,
  /// Run the subcategory search the API uses and show the patterns
  SearchSubcategory { term: String },
  /// Find products whose name contains every term
  FindProduct {
    #[arg(required = true, num_args = 1..)]
    terms: Vec<String>,
  },
  /// Send a test email through the configured provider
  TestEmail {
    #[arg(long)]
    to: String,
  },
  /// Create a test payment order through the configured gateway
  TestPayment {
    /// Minor units
    #[arg(long)]
    amount: i64,
    #[arg(long, default_value = "INR")]
    currency: String,
  },
}

#[derive(Subcommand, Debug)]
enum MigrateAction {
  /// Apply every pending migration
  Up,
  /// Revert the most recent migrations
  Down {
    #[arg(long, default_value_t = 1)]
    steps: usize,
  },
  /// List migrations and when they were applied
  Status,
  /// Print the resulting columns and product aggregates
  Verify,
  /// Re-run an applied migration's statements (backfills new null rows)
  Rerun {
    #[arg(long)]
    version: i64,
  },
}

#[actix_rt::main]
async fn main() -> ExitCode {
  telemetry::init_tracing("warn,petalcart=info");
  let cli = Cli::parse();

  match run(cli.command).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!(error = %format!("{:#}", e), "Command failed.");
      eprintln!("error: {:#}", e);
      ExitCode::FAILURE
    }
  }
}

async fn run(command: Commands) -> Result<()> {
  let config = AppConfig::from_env().context("loading configuration")?;

  match command {
    Commands::TestEmail { to } => return send_test_email(&config, &to).await,
    Commands::TestPayment { amount, currency } => return create_test_order(&config, amount, currency).await,
    _ => {}
  }

  let db = Database::connect(&config).await.context("connecting to the database")?;
  let outcome = run_with_db(&db, command).await;
  db.close().await;
  outcome
}

async fn run_with_db(db: &Database, command: Commands) -> Result<()> {
  match command {
    Commands::Migrate { action } => migrate(db, action).await,
    Commands::CheckColumns => check_columns(db).await,
    Commands::Categories => {
      let rows = products::category_summary(db).await?;
      for row in &rows {
        println!(
          "{:<24} {:<28} {:>5}",
          row.main_category.as_deref().unwrap_or("(none)"),
          row.subcategory.as_deref().unwrap_or("(none)"),
          row.product_count
        );
      }
      println!("{} category pairs", rows.len());
      Ok(())
    }
    Commands::SearchSubcategory { term } => {
      let expanded = SynonymTable.expand(term.trim());
      println!("Matching subcategory against: {}", expanded.join(" | "));
      let found = products::by_subcategory(db, &term).await?;
      print_products(&found);
      Ok(())
    }
    Commands::FindProduct { terms } => {
      let found = products::find_by_name_terms(db, &terms).await?;
      print_products(&found);
      Ok(())
    }
    Commands::TestEmail { .. } | Commands::TestPayment { .. } => Ok(()),
  }
}

async fn migrate(db: &Database, action: MigrateAction) -> Result<()> {
  let migrator = Migrator::new(db)?;
  match action {
    MigrateAction::Up => {
      let applied = migrator.up().await?;
      if applied.is_empty() {
        println!("Nothing to apply; schema is up to date.");
      } else {
        println!("Applied migrations: {:?}", applied);
      }
    }
    MigrateAction::Down { steps } => {
      let reverted = migrator.down(steps).await?;
      println!("Reverted migrations: {:?}", reverted);
    }
    MigrateAction::Status => {
      for status in migrator.status().await? {
        let applied = status
          .applied_at
          .map(|t| t.to_rfc3339())
          .unwrap_or_else(|| "pending".to_string());
        println!("{:>4}  {:<36} {}", status.version, status.name, applied);
      }
    }
    MigrateAction::Verify => print_schema_report(&migrator).await?,
    MigrateAction::Rerun { version } => {
      migrator.rerun(version).await?;
      println!("Re-ran migration {}.", version);
      print_schema_report(&migrator).await?;
    }
  }
  Ok(())
}

fn print_columns(table: &str, columns: &[ColumnInfo]) {
  println!("{} ({} columns)", table, columns.len());
  for c in columns {
    println!(
      "  {:<22} {:<28} nullable={:<3} default={}",
      c.column_name,
      c.data_type,
      c.is_nullable,
      c.column_default.as_deref().unwrap_or("-")
    );
  }
}

async fn print_schema_report(migrator: &Migrator<'_>) -> Result<()> {
  let report = migrator.verify().await?;
  print_columns("products", &report.products);
  print_columns("custom", &report.custom);
  match &report.aggregates {
    Some(a) => println!(
      "products: total={} discounted={} null original_price={} null discount_percentage={} null discount_amount={}",
      a.total, a.discounted, a.null_original_price, a.null_discount_percentage, a.null_discount_amount
    ),
    None => println!("products: discount columns missing; run `migrate up`."),
  }
  Ok(())
}

async fn check_columns(db: &Database) -> Result<()> {
  let migrator = Migrator::new(db)?;
  print_schema_report(&migrator).await?;

  let all = products::all(db).await?;
  let mut problems = 0;
  for p in &all {
    if !p.price_invariant_holds() {
      problems += 1;
      println!("#{} {}: price {} above original price {}", p.id, p.name, p.price, p.original_price);
    }
    if !p.stock_flag_consistent() {
      problems += 1;
      println!(
        "#{} {}: stock_quantity {} but in_stock={}",
        p.id, p.name, p.stock_quantity, p.in_stock
      );
    }
  }
  let discounted = all.iter().filter(|p| p.has_discount()).count();
  println!(
    "{} products checked, {} discounted, {} inconsistencies",
    all.len(),
    discounted,
    problems
  );
  Ok(())
}

fn print_products(found: &[Product]) {
  for p in found {
    println!(
      "#{:<5} {:<36} {:>7} {:<18} {:<22} {}",
      p.id,
      p.name,
      p.price,
      p.main_category.as_deref().unwrap_or("-"),
      p.subcategory.as_deref().unwrap_or("-"),
      if p.in_stock { "in stock" } else { "out of stock" }
    );
  }
  println!("{} products found", found.len());
}

async fn send_test_email(config: &AppConfig, to: &str) -> Result<()> {
  let mailer = email::mailer_from_config(config)?;
  let rendered = templates::test_email();
  let message = EmailMessage {
    from: EmailAddress::new(config.email_sender.clone(), Some(config.email_sender_name.clone())),
    to: EmailAddress::new(to, None),
    subject: rendered.subject,
    html: rendered.html,
  };
  let sent = mailer.send(&message).await.context("sending test email")?;
  println!("Sent via {}: status {} message id {}", mailer.name(), sent.status, sent.message_id);
  Ok(())
}

async fn create_test_order(config: &AppConfig, amount: i64, currency: String) -> Result<()> {
  let gateway = payment::gateway_from_config(config)?;
  let request = CreateOrderRequest {
    amount: Some(amount),
    currency: Some(currency),
    ..Default::default()
  };
  let order = gateway.create_order(&request.to_gateway_order()?).await.context("creating test order")?;
  println!("{}", serde_json::to_string_pretty(&order)?);
  Ok(())
}
