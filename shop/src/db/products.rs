// petalcart/src/db/products.rs

//! Catalog queries. Every read hits the live table; results come back in
//! storage (`id`) order with no ranking.

use crate::db::{Database, PRODUCTS_TABLE};
use crate::errors::Result;
use crate::models::{CategorySummary, Product, ProductFilter};
use crate::search;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, instrument};

/// Column list shared by every product read.
const PRODUCT_COLUMNS: &str = "id, name, price, \
  COALESCE(original_price, price) AS original_price, \
  COALESCE(discount_percentage, 0) AS discount_percentage, \
  COALESCE(discount_amount, 0) AS discount_amount, \
  stock_quantity, in_stock, main_category, subcategory, image_url";

fn select_products(db: &Database) -> String {
  format!("SELECT {} FROM {}", PRODUCT_COLUMNS, db.table(PRODUCTS_TABLE))
}

/// Listing behind `GET /api/products`.
///
/// `main_category` matches exactly, ignoring case. Every word of `search` must
/// appear somewhere in the name, subcategory or main category.
#[instrument(name = "products::list", skip(db), err(Display))]
pub async fn list(db: &Database, filter: &ProductFilter) -> Result<Vec<Product>> {
  let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(select_products(db));
  qb.push(" WHERE TRUE");

  if let Some(category) = filter.main_category() {
    qb.push(" AND LOWER(main_category) = LOWER(").push_bind(category.to_string()).push(")");
  }
  if let Some(query) = filter.search() {
    let patterns = search::all_terms_patterns(query);
    qb.push(" AND (name || ' ' || COALESCE(subcategory, '') || ' ' || COALESCE(main_category, '')) ILIKE ALL(")
      .push_bind(patterns)
      .push(")");
  }
  if let Some(in_stock) = filter.in_stock {
    qb.push(" AND in_stock = ").push_bind(in_stock);
  }
  qb.push(" ORDER BY id ASC LIMIT ")
    .push_bind(filter.limit())
    .push(" OFFSET ")
    .push_bind(filter.offset());

  let products = qb.build_query_as::<Product>().fetch_all(db.pool()).await?;
  debug!(count = products.len(), "Products listed.");
  Ok(products)
}

#[instrument(name = "products::get", skip(db), err(Display))]
pub async fn get(db: &Database, id: i32) -> Result<Option<Product>> {
  let sql = format!("{} WHERE id = $1", select_products(db));
  let product = sqlx::query_as::<_, Product>(&sql)
    .bind(id)
    .fetch_optional(db.pool())
    .await?;
  Ok(product)
}

/// Case-insensitive substring search on `subcategory`, widened by the synonym table.
#[instrument(name = "products::by_subcategory", skip(db), err(Display))]
pub async fn by_subcategory(db: &Database, term: &str) -> Result<Vec<Product>> {
  let term = search::clean_term(term)?;
  let patterns = search::subcategory_patterns(&term);
  debug!(?patterns, "Subcategory patterns.");
  let sql = format!("{} WHERE subcategory ILIKE ANY($1) ORDER BY id ASC", select_products(db));
  let products = sqlx::query_as::<_, Product>(&sql)
    .bind(patterns)
    .fetch_all(db.pool())
    .await?;
  Ok(products)
}

/// Case-insensitive substring search on `main_category`.
#[instrument(name = "products::by_main_category", skip(db), err(Display))]
pub async fn by_main_category(db: &Database, term: &str) -> Result<Vec<Product>> {
  let term = search::clean_term(term)?;
  let sql = format!("{} WHERE main_category ILIKE $1 ORDER BY id ASC", select_products(db));
  let products = sqlx::query_as::<_, Product>(&sql)
    .bind(search::contains_pattern(&term))
    .fetch_all(db.pool())
    .await?;
  Ok(products)
}

/// Products whose name contains every term, ignoring case.
#[instrument(name = "products::find_by_name_terms", skip(db), err(Display))]
pub async fn find_by_name_terms(db: &Database, terms: &[String]) -> Result<Vec<Product>> {
  let patterns: Vec<String> = terms
    .iter()
    .map(|t| t.trim())
    .filter(|t| !t.is_empty())
    .map(search::contains_pattern)
    .collect();
  if patterns.is_empty() {
    return Ok(Vec::new());
  }
  let sql = format!("{} WHERE name ILIKE ALL($1) ORDER BY id ASC", select_products(db));
  let products = sqlx::query_as::<_, Product>(&sql)
    .bind(patterns)
    .fetch_all(db.pool())
    .await?;
  Ok(products)
}

/// Distinct `(main_category, subcategory)` pairs with their product counts.
#[instrument(name = "products::category_summary", skip(db), err(Display))]
pub async fn category_summary(db: &Database) -> Result<Vec<CategorySummary>> {
  let sql = format!(
    "SELECT main_category, subcategory, COUNT(*) AS product_count FROM {} \
     GROUP BY main_category, subcategory \
     ORDER BY main_category ASC NULLS LAST, subcategory ASC NULLS LAST",
    db.table(PRODUCTS_TABLE)
  );
  let rows = sqlx::query_as::<_, CategorySummary>(&sql).fetch_all(db.pool()).await?;
  Ok(rows)
}

/// Every product, used by the column-check diagnostic.
#[instrument(name = "products::all", skip(db), err(Display))]
pub async fn all(db: &Database) -> Result<Vec<Product>> {
  let sql = format!("{} ORDER BY id ASC", select_products(db));
  let products = sqlx::query_as::<_, Product>(&sql).fetch_all(db.pool()).await?;
  Ok(products)
}
