// petalcart/src/services/mod.rs

//! Outbound integrations: payment gateway, email provider and email templates.

pub mod email;
pub mod payment;
pub mod templates;

pub use email::{EmailAddress, EmailMessage, EmailSender, MockMailer, SentEmail};
pub use payment::{MockPaymentGateway, PaymentGateway};
