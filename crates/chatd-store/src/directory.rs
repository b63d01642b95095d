//! Identity directory implementations
//!
//! The directory is consulted exactly once per connection, during the
//! identity handshake. A lookup has three outcomes: an identity, a clean
//! "no such account", or an availability error; the caller treats the last
//! two differently, so implementations must not collapse them.

use async_trait::async_trait;
use chatd_core::{CollabResult, CollaboratorError, Credentials, Identity, IdentityDirectory, IdentityId};
use std::collections::HashMap;

/// Directory that decodes self-describing tokens
///
/// A token is `<identity-id>:<display name>`. Anything else resolves to no
/// account. There is no verification step; this stands in for a real
/// directory service in single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory;

impl TokenDirectory {
    /// Create a token-decoding directory
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IdentityDirectory for TokenDirectory {
    async fn lookup_identity(&self, credentials: &Credentials) -> CollabResult<Option<Identity>> {
        let Some((id, display_name)) = credentials.token.split_once(':') else {
            tracing::debug!("Token without separator resolved to no account");
            return Ok(None);
        };
        if id.is_empty() || display_name.is_empty() {
            return Ok(None);
        }

        Ok(Some(Identity::registered(IdentityId::new(id), display_name)))
    }
}

/// Directory serving a fixed token-to-identity table
///
/// Can be put into a failing state to exercise outage handling.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    accounts: HashMap<String, Identity>,
    unavailable: bool,
}

impl StaticDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account reachable via `token`
    #[must_use]
    pub fn with_account(
        mut self,
        token: impl Into<String>,
        id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        self.accounts.insert(
            token.into(),
            Identity::registered(IdentityId::new(id.into()), display_name),
        );
        self
    }

    /// Make every lookup fail with an availability error
    #[must_use]
    pub fn into_unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl IdentityDirectory for StaticDirectory {
    async fn lookup_identity(&self, credentials: &Credentials) -> CollabResult<Option<Identity>> {
        if self.unavailable {
            return Err(CollaboratorError::Unavailable(
                "identity directory is offline".to_string(),
            ));
        }
        Ok(self.accounts.get(&credentials.token).cloned())
    }
}
