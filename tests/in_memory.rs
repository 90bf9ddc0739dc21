//! In-memory integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `publication_tests`: Single live agent per tenant, including under
//!   concurrent publishes
//! - `skill_tests`: Skill exposure independent of publication
//! - `sync_tests`: Change queue convergence, partial failure, single flight
//! - `health_tests`: Probe isolation from configuration
//! - `bridge_tests`: Bridge tokens resolving live state on every call

mod test_helpers;

mod in_memory {
    mod bridge_tests;
    mod health_tests;
    mod publication_tests;
    mod skill_tests;
    mod sync_tests;
}
