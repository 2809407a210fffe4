//! User account endpoints.

use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, AuthResponse, LoginRequest, RegisterRequest};

const LOGIN: &str = "api/users/login/";
const REGISTER: &str = "api/users/register/";

impl ApiClient {
    /// Exchange a username and password for a token pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest { username, password };
        self.send_json(Method::POST, LOGIN, &body)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(LOGIN.to_string()))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration or the request
    /// fails.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.send_json(Method::POST, REGISTER, request)
            .await?
            .ok_or_else(|| ApiError::EmptyBody(REGISTER.to_string()))
    }
}
