//! Agent component publication registry.
//!
//! A tenant may own many agent components but at most one of them is live
//! (published) at any observable instant. Publishing one component demotes
//! every other published component of the same tenant atomically.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
