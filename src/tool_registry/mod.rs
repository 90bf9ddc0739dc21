//! Tenant MCP server registry and restart coordination.
//!
//! Servers are configured through the registry service; every change is
//! queued and later pushed to the flow runtime by the restart coordinator.
//! A background health monitor probes enabled servers without touching the
//! queue. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
