//! In-memory identity resolver seeded from configuration.

use crate::tenant::{
    UserProfile,
    ports::{IdentityError, IdentityResolver, IdentityResult},
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Identity resolver backed by a static token table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityResolver {
    identities: Arc<RwLock<HashMap<String, UserProfile>>>,
}

#[derive(Debug, Deserialize)]
struct IdentityFileEntry {
    token: String,
    #[serde(flatten)]
    profile: UserProfile,
}

impl InMemoryIdentityResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads identities from a JSON array of `{token, tenant_id, email, ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Provider`] when the file cannot be read or
    /// parsed.
    pub fn from_file(path: &Path) -> IdentityResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(IdentityError::provider)?;
        let entries: Vec<IdentityFileEntry> =
            serde_json::from_str(&contents).map_err(IdentityError::provider)?;
        let resolver = Self::new();
        for entry in entries {
            resolver.register(entry.token, entry.profile)?;
        }
        Ok(resolver)
    }

    /// Maps `identity_token` to `profile`, replacing any previous mapping.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Provider`] when the lock is poisoned.
    pub fn register(
        &self,
        identity_token: impl Into<String>,
        profile: UserProfile,
    ) -> IdentityResult<()> {
        let mut identities = self
            .identities
            .write()
            .map_err(|err| IdentityError::provider(std::io::Error::other(err.to_string())))?;
        identities.insert(identity_token.into(), profile);
        Ok(())
    }
}

#[async_trait]
impl IdentityResolver for InMemoryIdentityResolver {
    async fn resolve(&self, identity_token: &str) -> IdentityResult<UserProfile> {
        let identities = self
            .identities
            .read()
            .map_err(|err| IdentityError::provider(std::io::Error::other(err.to_string())))?;
        identities
            .get(identity_token)
            .cloned()
            .ok_or(IdentityError::Unauthorized)
    }
}
