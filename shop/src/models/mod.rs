// petalcart/src/models/mod.rs

//! Database rows and request/response payloads.

pub mod custom_request;
pub mod order;
pub mod product;

pub use custom_request::{CustomRequest, NewCustomRequest};
pub use order::{
  CreateOrderRequest, CustomerContact, DeliveryDetails, GatewayOrder, LineItem, NewGatewayOrder, OrderNotification,
};
pub use product::{CategorySummary, Product, ProductFilter};
