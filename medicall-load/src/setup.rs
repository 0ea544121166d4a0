//! One-time token refresh that precedes the load.
use crate::config::PLACEHOLDER_REFRESH_TOKEN;
use crate::error::SetupError;
use crate::session::SessionContext;
use loadrun::check;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

const REFRESH_TOKEN_HEADER: &str = "Refresh-Token";

/// Check recorded for the refresh call.
pub const SETUP_CHECK: &str = "setup token refresh status is 200";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
}

/// Whether a preset refresh token is worth sending at all.
pub fn is_usable_token(token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && token != PLACEHOLDER_REFRESH_TOKEN
}

/// Exchange the preset refresh token for a fresh access/refresh pair.
///
/// An empty or placeholder token fails before any request is sent.
#[instrument(name = "setup", skip_all, fields(base_url = base_url))]
pub async fn refresh_session(
    client: &Client,
    base_url: &str,
    preset_refresh_token: &str,
) -> Result<SessionContext, SetupError> {
    if !is_usable_token(preset_refresh_token) {
        error!("No valid preset refresh token; refusing to start");
        return Err(SetupError::InvalidPresetToken);
    }

    let res = client
        .post(format!("{base_url}/auth/refresh"))
        .header(CONTENT_TYPE, "application/json")
        .header(REFRESH_TOKEN_HEADER, preset_refresh_token.trim())
        .send()
        .await?;

    let status = res.status();
    let headers = res.headers().clone();
    let body = res.text().await?;

    info!("Setup response status: {status}");
    info!("Setup response body: {body}");
    info!("Setup response headers: {headers:?}");

    if !check(SETUP_CHECK, status == StatusCode::OK) {
        warn!("Check failed: {SETUP_CHECK} (got {status})");
    }

    // Non-JSON bodies (e.g. gateway error pages) count as missing tokens.
    let tokens: TokenResponse = serde_json::from_str(&body).unwrap_or_else(|err| {
        debug!("Setup response is not a token payload: {err}");
        TokenResponse::default()
    });

    let non_empty = |token: Option<String>| token.filter(|t| !t.is_empty());
    match (non_empty(tokens.access_token), non_empty(tokens.refresh_token)) {
        (Some(access_token), Some(refresh_token)) => {
            let mut session = SessionContext::new(access_token, refresh_token);
            if let Some(token_type) = non_empty(tokens.token_type) {
                session.token_type = token_type;
            }
            info!("Session established");
            Ok(session)
        }
        _ => {
            error!("Token refresh failed with {status}");
            Err(SetupError::MissingTokens { status })
        }
    }
}
