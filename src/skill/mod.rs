//! Skill registry: which workflows are callable as bridge tools.
//!
//! Skill exposure is a per-workflow flag with no coupling to agent
//! publication. The bridge reads it live on every call, so toggling a skill
//! needs no synchronisation step.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
