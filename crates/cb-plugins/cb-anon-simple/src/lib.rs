//! # cb-anon-simple
//!
//! UUID-based implementation of `IdentityProvider`.
//!
//! Each visitor scope gets one stable 128-bit token, created on first use
//! and persisted under a fixed key. The token is an opaque correlation key
//! for vote deduplication and avatar derivation — it is
//! deduplication-as-courtesy, not security: clearing the scope mints a new
//! identity, and that is the intended anonymity model.

use cb_core::traits::{IdentityProvider, SessionScope};
use uuid::Uuid;

/// Storage key under which the token lives in a visitor scope.
pub const SESSION_KEY: &str = "session_id";

#[derive(Debug, Default)]
pub struct AnonIdentity;

impl AnonIdentity {
    pub fn new() -> Self {
        Self
    }

    fn mint() -> String {
        Uuid::new_v4().to_string()
    }
}

impl IdentityProvider for AnonIdentity {
    /// Returns the scope's token, creating it on first use.
    ///
    /// An unusable scope is fatal to persistence, not to the feature: the
    /// visitor gets a per-call ephemeral token and the page still works.
    fn get_or_create(&self, scope: &mut dyn SessionScope) -> String {
        match scope.get(SESSION_KEY) {
            Ok(Some(token)) if !token.is_empty() => token,
            Ok(_) => {
                let token = Self::mint();
                if let Err(err) = scope.set(SESSION_KEY, &token) {
                    log::warn!("session scope rejected token write, identity is ephemeral: {err}");
                }
                token
            }
            Err(err) => {
                log::warn!("session scope unreadable, identity is ephemeral: {err}");
                Self::mint()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cb_core::error::{AppError, Result};
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryScope(HashMap<String, String>);

    impl SessionScope for MemoryScope {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.0.get(key).cloned())
        }
        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenScope;

    impl SessionScope for BrokenScope {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AppError::Storage("scope offline".into()))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Storage("scope offline".into()))
        }
    }

    #[test]
    fn same_scope_returns_same_token() {
        let provider = AnonIdentity::new();
        let mut scope = MemoryScope::default();

        let first = provider.get_or_create(&mut scope);
        let second = provider.get_or_create(&mut scope);
        assert_eq!(first, second);
    }

    #[test]
    fn independent_scopes_get_distinct_tokens() {
        let provider = AnonIdentity::new();
        let mut a = MemoryScope::default();
        let mut b = MemoryScope::default();

        assert_ne!(provider.get_or_create(&mut a), provider.get_or_create(&mut b));
    }

    #[test]
    fn token_is_a_full_uuid() {
        let provider = AnonIdentity::new();
        let mut scope = MemoryScope::default();

        let token = provider.get_or_create(&mut scope);
        assert!(Uuid::parse_str(&token).is_ok());
    }

    #[test]
    fn broken_scope_degrades_to_ephemeral_tokens() {
        let provider = AnonIdentity::new();
        let mut scope = BrokenScope;

        let first = provider.get_or_create(&mut scope);
        let second = provider.get_or_create(&mut scope);
        assert!(!first.is_empty());
        // No persistence, so each call mints a fresh identity.
        assert_ne!(first, second);
    }

    #[test]
    fn empty_stored_token_is_replaced() {
        let provider = AnonIdentity::new();
        let mut scope = MemoryScope::default();
        scope.set(SESSION_KEY, "").unwrap();

        let token = provider.get_or_create(&mut scope);
        assert!(!token.is_empty());
        assert_eq!(scope.get(SESSION_KEY).unwrap().as_deref(), Some(token.as_str()));
    }
}
