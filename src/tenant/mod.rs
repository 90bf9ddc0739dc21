//! Tenant identity shared by every bounded context.
//!
//! Each user owns exactly one tenant. Registries scope their rows by
//! [`TenantId`], and the HTTP surface resolves the caller's tenant through the
//! [`ports::IdentityResolver`] port before invoking any service.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::{TenantId, UserProfile};
