//! Port definitions for the bridge context.

mod executor;
mod repository;

pub use executor::{FlowExecutor, FlowExecutorError, FlowExecutorResult};
pub use repository::{
    BridgeTokenRepository, BridgeTokenRepositoryError, BridgeTokenRepositoryResult,
};
