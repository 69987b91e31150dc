//! Authentication HTTP handlers.

use axum::extract::Query;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use shared_types::{AuthUserResponse, LoginInitResponse};

use crate::error::{ApiError, ApiResult};
use crate::{db, AppState};

use super::{build_auth_cookie, jwt, require_user};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USER_INFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Start Google OAuth login flow.
///
/// Returns a URL that the frontend should redirect the user to.
pub async fn auth_login(State(state): State<AppState>) -> ApiResult<Json<LoginInitResponse>> {
    let config = &state.auth_config;

    let csrf_state = uuid::Uuid::new_v4().to_string();
    let scopes = ["openid", "email", "profile"].join(" ");

    let auth_url = format!(
        "{}?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope={}&\
         state={}",
        GOOGLE_AUTH_URL,
        urlencoding::encode(&config.google_client_id),
        urlencoding::encode(&config.auth_redirect_uri),
        urlencoding::encode(&scopes),
        csrf_state
    );

    Ok(Json(LoginInitResponse { auth_url }))
}

#[derive(Debug, Deserialize)]
pub struct AuthCallbackParams {
    pub code: String,
    #[allow(dead_code)]
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    name: Option<String>,
    id: Option<String>,
}

/// Handle Google OAuth callback.
///
/// Exchanges the authorization code for tokens, creates the user row on
/// first login, mints a JWT, sets the auth cookie, and sends the browser
/// back to the frontend with the token.
pub async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<AuthCallbackParams>,
) -> Response {
    match handle_callback_inner(&state, params).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Auth callback error: {:?}", e);
            Redirect::to("/?auth_error=auth_failed").into_response()
        }
    }
}

async fn handle_callback_inner(
    state: &AppState,
    params: AuthCallbackParams,
) -> Result<Response, ApiError> {
    let config = &state.auth_config;

    // Exchange code for access token
    let client = reqwest::Client::new();

    #[derive(serde::Serialize)]
    struct TokenRequest {
        code: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        grant_type: String,
    }

    let token_response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&TokenRequest {
            code: params.code,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.auth_redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        })
        .send()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Token exchange failed: {}", e)))?;

    if !token_response.status().is_success() {
        let status = token_response.status();
        let body = token_response.text().await.unwrap_or_default();
        tracing::error!("Token exchange failed: {} - {}", status, body);
        return Ok(Redirect::to("/?auth_error=token_exchange_failed").into_response());
    }

    let tokens: GoogleTokenResponse = token_response
        .json()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid token response: {}", e)))?;

    // Get user info
    let user_info: GoogleUserInfo = client
        .get(GOOGLE_USER_INFO_URL)
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to get user info: {}", e)))?
        .json()
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Invalid user info response: {}", e)))?;

    tracing::info!("OAuth login attempt from: {}", user_info.email);

    // Provision the user row on first login
    let mut conn = db::get_conn(&state.pool).await?;
    let user = db::users::get_or_create_from_google(
        &mut conn,
        &user_info.email,
        user_info.name.as_deref(),
        user_info.id.as_deref(),
    )
    .await?;

    if !user.is_active {
        tracing::warn!("Login attempt for deactivated account: {}", user.email);
        return Ok(Redirect::to("/?auth_error=account_inactive").into_response());
    }

    // Create JWT
    let token = jwt::create_token(config, &user.email, user.name.clone())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create token: {}", e)))?;

    // Build cookie and bounce back to the frontend with the token
    let cookie = build_auth_cookie(&config.cookie_name, &token, config.token_duration_days);
    let location = format!("{}/auth/callback?token={}", config.frontend_url, token);

    tracing::info!("Successful login for: {}", user.email);

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, location.as_str()),
            (header::SET_COOKIE, cookie.as_str()),
        ],
    )
        .into_response())
}

/// Get current authenticated user info.
///
/// Sessions are sliding: once the presented token is more than a day old,
/// the response re-mints it and refreshes the cookie.
pub async fn auth_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let config = &state.auth_config;
    let mut conn = db::get_conn(&state.pool).await?;
    let user = require_user(&mut conn, &headers, config).await?;

    let claims = super::extract_claims(&headers, config)?;
    let body = Json(AuthUserResponse {
        id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
    });

    if jwt::should_refresh(&claims) {
        let token = jwt::create_token(config, &user.email, user.name)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to refresh token: {}", e)))?;
        let cookie = build_auth_cookie(&config.cookie_name, &token, config.token_duration_days);
        return Ok(([(header::SET_COOKIE, cookie)], body).into_response());
    }

    Ok(body.into_response())
}

/// Logout - clear auth cookie.
pub async fn auth_logout() -> impl IntoResponse {
    let cookie = "auth_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, "/"), (header::SET_COOKIE, cookie)],
    )
}
