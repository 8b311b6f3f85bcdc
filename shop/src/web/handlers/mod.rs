// petalcart/src/web/handlers/mod.rs

pub mod custom_request_handlers;
pub mod health_handlers;
pub mod notification_handlers;
pub mod payment_handlers;
pub mod product_handlers;
