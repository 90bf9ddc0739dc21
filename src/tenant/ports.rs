//! Identity resolution port.

use super::UserProfile;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity resolution.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Resolves an identity-provider token to the caller's profile.
///
/// Token verification belongs to the identity provider; implementations only
/// translate an already-issued token into a tenant-scoped profile.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the profile for `identity_token`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Unauthorized`] when the token is unknown.
    async fn resolve(&self, identity_token: &str) -> IdentityResult<UserProfile>;
}

/// Errors returned by identity resolvers.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    /// The token does not identify a user.
    #[error("identity token is not recognised")]
    Unauthorized,

    /// The identity provider could not be reached.
    #[error("identity provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityError {
    /// Wraps a provider failure.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }
}
