//! Switchboard: agent publication, skill exposure and MCP bridging.
//!
//! Each tenant authors agent components and workflows, publishes at most one
//! agent at a time, and exposes chosen workflows as skills. Desktop
//! connectors reach the live agent through a token-authenticated MCP bridge.
//! MCP server configuration is edited through a registry whose changes are
//! queued and applied to the runtime on demand.
//!
//! # Architecture
//!
//! Every bounded context follows the hexagonal layout:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (memory, `PostgreSQL`,
//!   network)
//! - **Services**: Use cases orchestrating domain objects through ports
//!
//! # Modules
//!
//! - [`tenant`]: Tenant identity and the identity resolver port
//! - [`publication`]: Agent components and the single-live-agent invariant
//! - [`skill`]: Workflows and their exposure as bridge skills
//! - [`tool_registry`]: MCP server registry, change queue, sync and health
//! - [`bridge`]: Bridge tokens, live tool resolution and the remote client
//! - [`http`]: The axum API surface
//! - [`config`] and [`app`]: Server configuration and assembly

pub mod app;
pub mod bridge;
pub mod config;
pub mod http;
pub mod publication;
pub mod skill;
pub mod tenant;
pub mod tool_registry;
