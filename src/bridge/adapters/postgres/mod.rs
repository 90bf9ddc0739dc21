//! `PostgreSQL` adapters for bridge token persistence.

mod models;
mod repository;
mod schema;

pub use repository::{BridgePgPool, PostgresBridgeTokenRepository};
