//! In-memory bridge adapters.

mod executor;
mod repository;

pub use executor::InMemoryFlowExecutor;
pub use repository::InMemoryBridgeTokenRepository;
