//! Adapter implementations for tool registry ports.

pub mod memory;
pub mod postgres;

mod cipher;
mod config_file;
mod network_probe;

pub use cipher::{CredentialCipher, CredentialCipherError, ENCRYPTED_PREFIX};
pub use config_file::ConfigFileMcpRuntime;
pub use network_probe::NetworkHealthProbe;
