// tests/db_tests.rs

//! Run with: DATABASE_URL=postgres://... cargo test -p petalcart -- --ignored
//!
//! Each test works in its own freshly created schema and drops it afterwards.

mod common;

use petalcart::config::AppConfig;
use petalcart::db::migrations::{Migrator, MIGRATIONS};
use petalcart::db::{custom_requests, products, Database, PRODUCTS_TABLE};
use petalcart::errors::AppError;
use petalcart::models::{NewCustomRequest, ProductFilter};

async fn fresh_db() -> Database {
  common::setup_tracing();
  let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
  let schema = format!("petalcart_test_{}", &uuid::Uuid::new_v4().simple().to_string()[..12]);
  let config = AppConfig::from_lookup(|key| match key {
    "DATABASE_URL" => Some(url.clone()),
    "DB_SCHEMA" => Some(schema.clone()),
    _ => None,
  })
  .expect("config");
  Database::connect(&config).await.expect("database connection")
}

async fn drop_schema(db: Database) {
  let sql = format!("DROP SCHEMA IF EXISTS \"{}\" CASCADE", db.schema());
  sqlx::query(&sql).execute(db.pool()).await.expect("drop schema");
  db.close().await;
}

async fn insert_product(db: &Database, name: &str, price: i32, main_category: &str, subcategory: &str) {
  insert_stocked_product(db, name, price, 10, main_category, subcategory).await;
}

async fn insert_stocked_product(
  db: &Database,
  name: &str,
  price: i32,
  stock_quantity: i32,
  main_category: &str,
  subcategory: &str,
) {
  let sql = format!(
    "INSERT INTO {} (name, price, stock_quantity, in_stock, main_category, subcategory) VALUES ($1, $2, $3, $4, $5, $6)",
    db.table(PRODUCTS_TABLE)
  );
  sqlx::query(&sql)
    .bind(name)
    .bind(price)
    .bind(stock_quantity)
    .bind(stock_quantity > 0)
    .bind(main_category)
    .bind(subcategory)
    .execute(db.pool())
    .await
    .expect("insert product");
}

async fn seeded_catalog() -> Database {
  let db = fresh_db().await;
  Migrator::new(&db).unwrap().up().await.expect("migrate up");
  insert_product(&db, "White Lilies Bouquet", 1200, "Flowers", "Lilies").await;
  insert_stocked_product(&db, "Mixed Roses", 1500, 5, "Flowers", "Roses").await;
  insert_product(&db, "Valentine Special", 2000, "Occasions", "Valentine's Day").await;
  insert_product(&db, "Red Roses Box", 1800, "Flowers", "Roses").await;
  db
}

#[tokio::test]
#[ignore = "requires database"]
async fn migrations_backfill_and_are_idempotent() {
  let db = fresh_db().await;

  // Legacy state: base tables only, rows written before the discount columns existed.
  let base = Migrator::with_migrations(&db, &MIGRATIONS[..1]).unwrap();
  assert_eq!(base.up().await.unwrap(), vec![1]);
  insert_product(&db, "Sunflower Joy", 900, "Flowers", "Sunflowers").await;
  insert_product(&db, "Orchid Pot", 2500, "Plants", "Orchids").await;

  let migrator = Migrator::new(&db).unwrap();
  assert_eq!(migrator.up().await.unwrap(), vec![2, 3]);

  let report = migrator.verify().await.unwrap();
  for column in ["original_price", "discount_percentage", "discount_amount"] {
    assert!(report.has_product_column(column), "missing {}", column);
  }
  for column in ["user_name", "user_email", "user_phone"] {
    assert!(report.has_custom_column(column), "missing {}", column);
  }
  let aggregates = report.aggregates.clone().expect("aggregates");
  assert_eq!(aggregates.total, 2);
  assert_eq!(aggregates.discounted, 0);
  assert_eq!(aggregates.null_original_price, 0);
  assert_eq!(aggregates.null_discount_percentage, 0);
  assert_eq!(aggregates.null_discount_amount, 0);

  for p in products::all(&db).await.unwrap() {
    assert_eq!(p.original_price, p.price);
    assert!(p.price_invariant_holds());
  }

  // Second run: nothing applied, schema unchanged.
  assert!(migrator.up().await.unwrap().is_empty());
  migrator.rerun(2).await.unwrap();
  let again = migrator.verify().await.unwrap();
  assert_eq!(again.products, report.products);
  assert_eq!(again.custom, report.custom);

  let statuses = migrator.status().await.unwrap();
  assert_eq!(statuses.len(), MIGRATIONS.len());
  assert!(statuses.iter().all(|s| s.applied_at.is_some()));

  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn concurrent_runners_apply_each_migration_once() {
  let db = fresh_db().await;
  let first = Migrator::new(&db).unwrap();
  let second = Migrator::new(&db).unwrap();
  first.ensure_ledger().await.unwrap();

  let (a, b) = tokio::join!(first.up(), second.up());
  let mut applied = a.unwrap();
  applied.extend(b.unwrap());
  applied.sort_unstable();
  let expected: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
  assert_eq!(applied, expected);

  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn rerun_refuses_pending_migrations() {
  let db = fresh_db().await;
  let base = Migrator::with_migrations(&db, &MIGRATIONS[..1]).unwrap();
  base.up().await.unwrap();

  let migrator = Migrator::new(&db).unwrap();
  let err = migrator.rerun(3).await.unwrap_err();
  assert!(matches!(err, AppError::Migration(_)), "unexpected error: {}", err);

  let report = migrator.verify().await.unwrap();
  assert!(!report.has_custom_column("user_email"));
  let statuses = migrator.status().await.unwrap();
  assert!(statuses.iter().find(|s| s.version == 3).unwrap().applied_at.is_none());

  migrator.rerun(1).await.unwrap();
  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn down_reverts_the_latest_migration() {
  let db = fresh_db().await;
  let migrator = Migrator::new(&db).unwrap();
  migrator.up().await.unwrap();

  assert_eq!(migrator.down(1).await.unwrap(), vec![3]);
  let report = migrator.verify().await.unwrap();
  assert!(!report.has_custom_column("user_email"));
  assert!(report.has_product_column("discount_amount"));

  let statuses = migrator.status().await.unwrap();
  assert!(statuses.iter().find(|s| s.version == 3).unwrap().applied_at.is_none());

  assert_eq!(migrator.up().await.unwrap(), vec![3]);
  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn subcategory_search_matches_substrings_case_insensitively() {
  let db = seeded_catalog().await;

  let lilies = products::by_subcategory(&db, "lilies").await.unwrap();
  assert_eq!(lilies.len(), 1);
  assert_eq!(lilies[0].name, "White Lilies Bouquet");

  let roses = products::by_subcategory(&db, "ROS").await.unwrap();
  let names: Vec<&str> = roses.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, vec!["Mixed Roses", "Red Roses Box"]);

  let valentine = products::by_subcategory(&db, "valentines").await.unwrap();
  assert_eq!(valentine.len(), 1);
  assert_eq!(valentine[0].subcategory.as_deref(), Some("Valentine's Day"));

  assert!(products::by_subcategory(&db, "hydrangea").await.unwrap().is_empty());
  assert!(products::by_subcategory(&db, "%").await.unwrap().is_empty());

  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn name_lookup_and_listing_filters() {
  let db = seeded_catalog().await;

  let mixed = products::find_by_name_terms(&db, &["mixed".to_string(), "roses".to_string()])
    .await
    .unwrap();
  assert_eq!(mixed.len(), 1);
  assert_eq!(mixed[0].name, "Mixed Roses");
  assert_eq!(mixed[0].price, 1500);
  assert_eq!(mixed[0].stock_quantity, 5);
  assert!(mixed[0].in_stock);

  let filter = ProductFilter {
    main_category: Some("flowers".to_string()),
    search: Some("roses".to_string()),
    ..Default::default()
  };
  let listed = products::list(&db, &filter).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed[0].id < listed[1].id);

  let occasions = products::by_main_category(&db, "occas").await.unwrap();
  assert_eq!(occasions.len(), 1);

  let got = products::get(&db, mixed[0].id).await.unwrap();
  assert_eq!(got.as_ref().map(|p| p.name.as_str()), Some("Mixed Roses"));
  assert!(products::get(&db, 999_999).await.unwrap().is_none());

  let summary = products::category_summary(&db).await.unwrap();
  let roses = summary
    .iter()
    .find(|c| c.subcategory.as_deref() == Some("Roses"))
    .unwrap();
  assert_eq!(roses.product_count, 2);

  drop_schema(db).await;
}

#[tokio::test]
#[ignore = "requires database"]
async fn custom_requests_are_listed_newest_first() {
  let db = fresh_db().await;
  Migrator::new(&db).unwrap().up().await.unwrap();

  for message in ["Need 50 white roses for a wedding", "Can you deliver on Sunday?"] {
    let request = NewCustomRequest {
      user_name: Some(" Asha ".to_string()),
      user_email: Some("asha@example.com".to_string()),
      user_phone: None,
      message: message.to_string(),
    }
    .normalized()
    .unwrap();
    let stored = custom_requests::insert(&db, &request).await.unwrap();
    assert_eq!(stored.user_name.as_deref(), Some("Asha"));
  }

  let listed = custom_requests::list_recent(&db, None).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].message.as_deref(), Some("Can you deliver on Sunday?"));
  assert_eq!(custom_requests::list_recent(&db, Some(1)).await.unwrap().len(), 1);

  drop_schema(db).await;
}
