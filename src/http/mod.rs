//! HTTP surface: the axum router over the registry and bridge services.
//!
//! Management routes authenticate with an identity token and are scoped to
//! the caller's tenant. Bridge routes authenticate with a bridge token.
//! Every failure is rendered through [`error::ApiError`].

pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorBody, ErrorCode, ErrorResponse};
pub use state::{Adapters, AppState, ServiceTimeouts};

use axum::Router;
use axum::routing::{get, patch, post};
use handlers::{agents, bridge, desktop, mcp_servers, workflows};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Route prefix shared by every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Builds the router with every API route.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        // Publication
        .route("/agent-components", get(agents::list).post(agents::create))
        .route("/agent-components/{id}", get(agents::get))
        .route("/agent-components/{id}/publish", post(agents::publish))
        .route("/agent-components/{id}/unpublish", post(agents::unpublish))
        // Skills
        .route("/workflows", get(workflows::list).post(workflows::create))
        .route("/workflows/{id}", get(workflows::get))
        .route("/workflows/{id}/agent-skill", patch(workflows::set_agent_skill))
        // MCP server registry
        .route("/mcp-servers", get(mcp_servers::list).post(mcp_servers::create))
        .route("/mcp-servers/templates", get(mcp_servers::templates))
        .route("/mcp-servers/from-template", post(mcp_servers::create_from_template))
        .route("/mcp-servers/sync", post(mcp_servers::sync))
        .route("/mcp-servers/test-connection", post(mcp_servers::test_connection))
        .route(
            "/mcp-servers/{id}",
            get(mcp_servers::get)
                .patch(mcp_servers::update)
                .delete(mcp_servers::delete),
        )
        .route("/mcp-servers/{id}/enable", post(mcp_servers::enable))
        .route("/mcp-servers/{id}/disable", post(mcp_servers::disable))
        .route(
            "/mcp-servers/{id}/health",
            get(mcp_servers::check_health).post(mcp_servers::check_health),
        )
        .route("/restart-status", get(mcp_servers::restart_status))
        // Desktop connector
        .route("/desktop/bootstrap", get(desktop::bootstrap))
        .route("/desktop/bridge-token/revoke", post(desktop::revoke_token))
        // Bridge
        .route("/mcp/bridge/tools", get(bridge::list_tools))
        .route("/mcp/bridge/tools/call", post(bridge::call_tool))
        .route("/mcp/bridge/{user_id}/tools", get(bridge::list_user_tools))
        .route("/mcp/bridge/{user_id}/tools/call", post(bridge::call_user_tool));

    Router::new()
        .route("/health", get(handlers::health))
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
