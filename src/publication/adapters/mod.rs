//! Adapter implementations for the agent component repository port.

pub mod memory;
pub mod postgres;
