//! Identity resolver adapters.

mod memory;

pub use memory::InMemoryIdentityResolver;
