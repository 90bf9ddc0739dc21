//! Route handlers, one module per resource.

pub mod agents;
pub mod bridge;
pub mod desktop;
pub mod mcp_servers;
pub mod workflows;

use axum::Json;
use serde_json::{Value, json};

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
