//! Secret key/value pairs attached to an MCP server.

use super::{ToolRegistryDomainError, validation::sanitize_env_var};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Credentials handed to an MCP server process as environment variables.
///
/// Values never leave the registry through its read APIs and are redacted
/// from `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct McpCredentials(BTreeMap<String, String>);

impl McpCredentials {
    /// Creates a validated credential set.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidEnvVarName`] or
    /// [`ToolRegistryDomainError::BlockedEnvVar`] when a key cannot be used as
    /// an environment variable.
    pub fn new(
        values: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ToolRegistryDomainError> {
        let mut credentials = BTreeMap::new();
        for (key, value) in values {
            let sanitized = sanitize_env_var(&key, &value)?;
            credentials.insert(key, sanitized);
        }
        Ok(Self(credentials))
    }

    /// Returns whether no credentials are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether a credential with `key` exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over credential keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over credential pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl fmt::Debug for McpCredentials {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.0.keys().map(|key| (key, "<redacted>")))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_values() {
        let credentials = McpCredentials::new([("API_KEY".to_owned(), "s3cret".to_owned())])
            .expect("valid credentials");

        let rendered = format!("{credentials:?}");

        assert!(rendered.contains("API_KEY"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn blocked_credential_keys_are_rejected() {
        let result = McpCredentials::new([("LD_PRELOAD".to_owned(), "x".to_owned())]);

        assert_eq!(
            result,
            Err(ToolRegistryDomainError::BlockedEnvVar("LD_PRELOAD".to_owned()))
        );
    }
}
