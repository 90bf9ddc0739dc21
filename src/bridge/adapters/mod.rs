//! Adapter implementations for bridge ports.

pub mod memory;
pub mod postgres;

mod http_executor;

pub use http_executor::HttpFlowExecutor;
