//! Auth-related types and configuration.

use serde::{Deserialize, Serialize};

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// User display name from Google
    pub name: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Auth configuration loaded from environment
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_duration_days: i64,
    pub cookie_name: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub auth_redirect_uri: String,
    /// Where the OAuth callback sends the browser after login.
    pub frontend_url: String,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET`: Secret key for signing JWTs
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID
    /// - `GOOGLE_CLIENT_SECRET`: Google OAuth client secret
    /// - `AUTH_REDIRECT_URI`: OAuth callback URI for user login
    ///
    /// Optional:
    /// - `FRONTEND_URL`: login redirect target (default http://localhost:3000)
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        Ok(Self {
            jwt_secret,
            token_duration_days: 7,
            cookie_name: "auth_token".to_string(),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| "GOOGLE_CLIENT_ID must be set".to_string())?,
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
                .map_err(|_| "GOOGLE_CLIENT_SECRET must be set".to_string())?,
            auth_redirect_uri: std::env::var("AUTH_REDIRECT_URI")
                .map_err(|_| "AUTH_REDIRECT_URI must be set".to_string())?,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }
}
