use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::fmt;

/// Tokens obtained during setup, shared read-only by every VU.
#[derive(Clone)]
pub struct SessionContext {
    access_token: String,
    refresh_token: String,
    /// Scheme used in the `Authorization` header.
    pub token_type: String,
}

impl SessionContext {
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// `Authorization` and `Content-Type` headers sent with every journey request.
    pub fn auth_headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut auth =
            HeaderValue::from_str(&format!("{} {}", self.token_type, self.access_token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(headers)
    }
}

// Keeps tokens out of logs.
impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_bearer_header() {
        let session = SessionContext::new("abc".to_string(), "def".to_string());
        let headers = session.auth_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn header_uses_issued_token_type() {
        let mut session = SessionContext::new("abc".to_string(), "def".to_string());
        session.token_type = "Token".to_string();
        let headers = session.auth_headers().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Token abc");
    }

    #[test]
    fn debug_hides_tokens() {
        let session = SessionContext::new("abc".to_string(), "def".to_string());
        let debug = format!("{session:?}");
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("def"));
    }

    #[test]
    fn rejects_unprintable_tokens() {
        let session = SessionContext::new("a\nb".to_string(), "def".to_string());
        assert!(session.auth_headers().is_err());
    }
}
