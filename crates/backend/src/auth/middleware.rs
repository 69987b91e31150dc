//! Token extraction and request-level user resolution.

use axum::http::{header, HeaderMap};
use diesel_async::AsyncPgConnection;
use shared_types::User;

use crate::db;
use crate::error::ApiError;

use super::jwt;
use super::types::{AuthConfig, Claims};

/// Pull validated claims out of a request's headers.
///
/// The token is taken from the auth cookie first, then from a bearer
/// `Authorization` header.
pub fn extract_claims(headers: &HeaderMap, config: &AuthConfig) -> Result<Claims, ApiError> {
    let token = extract_token_from_cookie(headers, &config.cookie_name)
        .or_else(|| extract_token_from_header(headers))
        .ok_or_else(|| ApiError::Unauthorized("Missing authentication".to_string()))?;

    jwt::validate_token(config, &token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))
}

/// Resolve the authenticated user for a request.
///
/// Validates the token, then loads the user row by the claim's email.
/// Unknown emails are 401 (the row is only created by the OAuth callback);
/// deactivated accounts are 403.
pub async fn require_user(
    conn: &mut AsyncPgConnection,
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Result<User, ApiError> {
    let claims = extract_claims(headers, config)?;

    let user = db::users::get_by_email(conn, &claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Could not validate credentials".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("User account is inactive".to_string()));
    }

    Ok(user)
}

fn extract_token_from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie_str in cookie_header.split(';') {
        if let Ok(cookie) = cookie::Cookie::parse(cookie_str.trim()) {
            if cookie.name() == cookie_name {
                return Some(cookie.value().to_string());
            }
        }
    }

    None
}

fn extract_token_from_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|s| s.to_string())
}

/// Build an auth cookie string.
pub fn build_auth_cookie(name: &str, value: &str, days: i64) -> String {
    let max_age = days * 24 * 60 * 60;
    let secure = if std::env::var("RUST_ENV").unwrap_or_default() == "production" {
        "; Secure"
    } else {
        ""
    };
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        name, value, max_age, secure
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-key-for-testing-only".to_string(),
            token_duration_days: 7,
            cookie_name: "auth_token".to_string(),
            google_client_id: "test".to_string(),
            google_client_secret: "test".to_string(),
            auth_redirect_uri: "http://localhost/callback".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
        }
    }

    #[test]
    fn claims_extracted_from_bearer_header() {
        let config = test_config();
        let token = jwt::create_token(&config, "a@b.com", None).expect("token");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );

        let claims = extract_claims(&headers, &config).expect("claims");
        assert_eq!(claims.sub, "a@b.com");
    }

    #[test]
    fn claims_extracted_from_cookie() {
        let config = test_config();
        let token = jwt::create_token(&config, "a@b.com", None).expect("token");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("other=1; auth_token={token}")).expect("header"),
        );

        let claims = extract_claims(&headers, &config).expect("claims");
        assert_eq!(claims.sub, "a@b.com");
    }

    #[test]
    fn missing_token_is_unauthorized() {
        let config = test_config();
        let headers = HeaderMap::new();

        match extract_claims(&headers, &config) {
            Err(ApiError::Unauthorized(_)) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
