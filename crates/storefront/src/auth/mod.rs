//! Session authentication.
//!
//! [`AuthService`] logs users in against the backend, keeps the issued tokens
//! in a [`SessionCredentials`] shared with the REST transport, and announces
//! every state change on [`AuthEvents`].

mod credentials;
mod events;

pub use credentials::{CredentialProvider, SessionCredentials};
pub use events::{AuthEvent, AuthEvents};

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use phanto_core::Email;

use crate::api::{ApiClient, ApiError, AuthResponse, RegisterRequest, User};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The backend rejected the email/password pair.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The backend refused the registration.
    #[error("{0}")]
    RegistrationRejected(String),

    /// The login reply carried no tokens.
    #[error("login succeeded but no tokens were issued")]
    MissingTokens,

    /// Transport or decoding failure.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Authentication service.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    credentials: Arc<SessionCredentials>,
    events: AuthEvents,
    user: Arc<RwLock<Option<User>>>,
}

impl AuthService {
    /// Create a service over a shared session.
    #[must_use]
    pub fn new(api: ApiClient, credentials: Arc<SessionCredentials>, events: AuthEvents) -> Self {
        Self {
            api,
            credentials,
            events,
            user: Arc::new(RwLock::new(None)),
        }
    }

    /// Log in with email and password.
    ///
    /// The backend authenticates by username; accounts are registered with
    /// their email as username.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` with the backend's message (or
    /// "invalid credentials") when the login is refused.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<User, AuthError> {
        let response = self
            .api
            .login(email.as_str(), password.expose_secret())
            .await
            .map_err(|e| match e {
                ApiError::Server { status, message } if (400..500).contains(&status) => {
                    AuthError::InvalidCredentials(credential_message(message))
                }
                other => AuthError::Api(other),
            })?;

        if response.tokens.is_none() {
            warn!("Login reply carried no tokens");
            return Err(AuthError::MissingTokens);
        }

        Ok(self.start_session(response))
    }

    /// Create an account.
    ///
    /// Returns the signed-in user when the backend issues tokens right away,
    /// `None` when the account must log in separately.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationRejected` with every field error the
    /// backend reported.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, AuthError> {
        let response = self.api.register(request).await.map_err(|e| match e {
            ApiError::Server { status, message } if (400..500).contains(&status) => {
                AuthError::RegistrationRejected(message)
            }
            other => AuthError::Api(other),
        })?;

        if response.tokens.is_none() {
            info!(user_id = %response.user.id, "Registered; login required");
            return Ok(None);
        }

        Ok(Some(self.start_session(response)))
    }

    /// Drop the session and announce the logout.
    pub fn logout(&self) {
        self.credentials.clear();
        let previous = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user) = previous {
            info!(user_id = %user.id, "Logged out");
        }
        self.events.publish(AuthEvent::LoggedOut);
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the session holds an access token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Event channel this service publishes on.
    #[must_use]
    pub const fn events(&self) -> &AuthEvents {
        &self.events
    }

    fn start_session(&self, response: AuthResponse) -> User {
        let AuthResponse { tokens, user } = response;
        if let Some(tokens) = tokens {
            let (access, refresh) = tokens.into_secrets();
            self.credentials.set(access, Some(refresh));
        }

        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        info!(user_id = %user.id, "Logged in");
        self.events.publish(AuthEvent::LoggedIn { user_id: user.id });
        user
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("base_url", &self.api.base_url().as_str())
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// The status-line fallback means the body had nothing useful to say.
fn credential_message(message: String) -> String {
    if message.starts_with("HTTP error!") {
        "invalid credentials".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_message_fallback() {
        assert_eq!(
            credential_message("HTTP error! status: 401".to_string()),
            "invalid credentials"
        );
        assert_eq!(
            credential_message("No active account found".to_string()),
            "No active account found"
        );
    }

    #[test]
    fn test_auth_error_display_is_server_message() {
        let err = AuthError::RegistrationRejected("Too short., Too common.".to_string());
        assert_eq!(err.to_string(), "Too short., Too common.");
    }
}
