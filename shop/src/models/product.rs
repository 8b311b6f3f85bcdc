// petalcart/src/models/product.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog row. Prices are whole currency units.
///
/// Discount columns are read through `COALESCE`, so rows written before the
/// discount migration still load (`original_price` falls back to `price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: i32,
  pub name: String,
  pub price: i32,
  pub original_price: i32,
  pub discount_percentage: i32,
  pub discount_amount: i32,
  pub stock_quantity: i32,
  pub in_stock: bool,
  pub main_category: Option<String>,
  pub subcategory: Option<String>,
  pub image_url: Option<String>,
}

impl Product {
  pub fn has_discount(&self) -> bool {
    (self.discount_percentage > 0 || self.discount_amount > 0) && self.original_price > self.price
  }

  /// How much cheaper than the original price, never negative.
  pub fn savings(&self) -> i32 {
    (self.original_price - self.price).max(0)
  }

  pub fn price_invariant_holds(&self) -> bool {
    self.price <= self.original_price
  }

  pub fn stock_flag_consistent(&self) -> bool {
    self.stock_quantity >= 0 && self.in_stock == (self.stock_quantity > 0)
  }
}

/// Query string of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
  pub main_category: Option<String>,
  pub search: Option<String>,
  pub in_stock: Option<bool>,
  pub limit: Option<i64>,
  pub offset: Option<i64>,
}

impl ProductFilter {
  pub const DEFAULT_LIMIT: i64 = 100;
  pub const MAX_LIMIT: i64 = 500;

  pub fn limit(&self) -> i64 {
    self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
  }

  pub fn offset(&self) -> i64 {
    self.offset.unwrap_or(0).max(0)
  }

  /// Category with surrounding whitespace removed; blank counts as absent.
  pub fn main_category(&self) -> Option<&str> {
    self.main_category.as_deref().map(str::trim).filter(|c| !c.is_empty())
  }

  pub fn search(&self) -> Option<&str> {
    self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
  }
}

/// One `(main_category, subcategory)` pair of the catalog with its product count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategorySummary {
  pub main_category: Option<String>,
  pub subcategory: Option<String>,
  pub product_count: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn product(price: i32, original_price: i32, pct: i32, stock: i32, in_stock: bool) -> Product {
    Product {
      id: 1,
      name: "Mixed Roses".to_string(),
      price,
      original_price,
      discount_percentage: pct,
      discount_amount: original_price - price,
      stock_quantity: stock,
      in_stock,
      main_category: Some("Flowers".to_string()),
      subcategory: Some("Roses".to_string()),
      image_url: None,
    }
  }

  #[test]
  fn discount_helpers() {
    let discounted = product(900, 1000, 10, 5, true);
    assert!(discounted.has_discount());
    assert_eq!(discounted.savings(), 100);
    assert!(discounted.price_invariant_holds());

    let full_price = product(1000, 1000, 0, 5, true);
    assert!(!full_price.has_discount());
    assert_eq!(full_price.savings(), 0);

    let inverted = product(1200, 1000, 0, 5, true);
    assert!(!inverted.price_invariant_holds());
    assert_eq!(inverted.savings(), 0);
  }

  #[test]
  fn stock_flag_consistency() {
    assert!(product(500, 500, 0, 5, true).stock_flag_consistent());
    assert!(product(500, 500, 0, 0, false).stock_flag_consistent());
    assert!(!product(500, 500, 0, 0, true).stock_flag_consistent());
    assert!(!product(500, 500, 0, -1, false).stock_flag_consistent());
  }

  #[test]
  fn filter_paging_is_clamped() {
    let filter = ProductFilter {
      limit: Some(10_000),
      offset: Some(-3),
      ..Default::default()
    };
    assert_eq!(filter.limit(), ProductFilter::MAX_LIMIT);
    assert_eq!(filter.offset(), 0);
    assert_eq!(ProductFilter::default().limit(), ProductFilter::DEFAULT_LIMIT);
  }

  #[test]
  fn blank_filter_values_count_as_absent() {
    let filter = ProductFilter {
      main_category: Some("  ".to_string()),
      search: Some(" roses ".to_string()),
      ..Default::default()
    };
    assert_eq!(filter.main_category(), None);
    assert_eq!(filter.search(), Some("roses"));
  }
}
