// petalcart/src/lib.rs

//! PetalCart: the backend of a flower shop.
//!
//! Catalog reads and enquiry storage go straight to PostgreSQL through
//! parameterized SQL; payment orders and transactional email are single calls
//! to hosted services; the frontend bundle is proxied or served by
//! [`dev_assets`].

pub mod config;
pub mod db;
pub mod dev_assets;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod search;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod web;
