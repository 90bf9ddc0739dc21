//! In-memory tool registry adapters.

mod probe;
mod repository;
mod runtime;

pub use probe::InMemoryHealthProbe;
pub use repository::InMemoryMcpServerRegistry;
pub use runtime::InMemoryMcpRuntime;
