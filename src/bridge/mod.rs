//! Bridge sessions: how remote processes reach the live agent.
//!
//! A desktop companion bootstraps with the user's identity token and receives
//! a long-lived bridge token. The token only identifies the tenant. Each
//! bridge call resolves the published agent and the active skills afresh, so
//! the bridge never acts on a stale view of what is live.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - The remote-side HTTP client in [`client`]

pub mod adapters;
pub mod client;
pub mod domain;
pub mod ports;
pub mod services;
