//! Credential provider injected into the REST transport.

use std::sync::{PoisonError, RwLock};

use secrecy::SecretString;

/// Source of the bearer token attached to every backend request.
///
/// The transport asks on each request, so a provider may rotate or drop
/// its token at any time.
pub trait CredentialProvider: Send + Sync {
    /// The current access token, if the session is authenticated.
    fn bearer_token(&self) -> Option<SecretString>;
}

/// Tokens held for the lifetime of the process.
///
/// Nothing here touches disk: a restarted client starts anonymous.
#[derive(Default)]
pub struct SessionCredentials {
    tokens: RwLock<Option<Tokens>>,
}

#[derive(Clone)]
struct Tokens {
    access: SecretString,
    refresh: Option<SecretString>,
}

impl SessionCredentials {
    /// An anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that starts with a pre-issued access token.
    #[must_use]
    pub fn with_token(access: SecretString) -> Self {
        Self {
            tokens: RwLock::new(Some(Tokens {
                access,
                refresh: None,
            })),
        }
    }

    /// Replace the held tokens.
    pub fn set(&self, access: SecretString, refresh: Option<SecretString>) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Tokens { access, refresh });
    }

    /// Forget the held tokens.
    pub fn clear(&self) {
        *self.tokens.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether an access token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// The refresh token issued alongside the access token.
    #[must_use]
    pub fn refresh_token(&self) -> Option<SecretString> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|t| t.refresh.clone())
    }
}

impl CredentialProvider for SessionCredentials {
    fn bearer_token(&self) -> Option<SecretString> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|t| t.access.clone())
    }
}

impl std::fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
