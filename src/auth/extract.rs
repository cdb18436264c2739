use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::server::AppState;
use crate::types::Principal;

/// Name of the HTTP-only session cookie. Clients never read the token, they
/// only carry it.
pub const SESSION_COOKIE: &str = "rately_session";

/// Extractor that requires a live session and yields the request principal.
pub struct RequireAuth(pub Principal);

#[derive(Debug)]
pub enum AuthError {
    MissingSession,
    InvalidSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingSession => "Authentication required",
            AuthError::InvalidSession => "Session is invalid or expired",
        };

        let body = json!({ "data": null, "error": message });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(parts).ok_or(AuthError::MissingSession)?;

        let session = state
            .sessions
            .lookup(&token)
            .ok_or(AuthError::InvalidSession)?;

        Ok(RequireAuth(Principal {
            id: session.user_id,
            role: session.role,
        }))
    }
}

/// Pulls the session token out of the Cookie header, if present.
pub fn extract_session_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(session_token_from_cookie_header)
}

/// Parses the session token out of a raw Cookie header value.
pub fn session_token_from_cookie_header(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// Builds the Set-Cookie value that installs a session token.
#[must_use]
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

/// Builds the Set-Cookie value that clears the session cookie.
#[must_use]
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let token = session_token_from_cookie_header("rately_session=abc123");
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_cookie_header_among_others() {
        let header = "theme=dark; rately_session=abc123; lang=en";
        let token = session_token_from_cookie_header(header);
        assert_eq!(token.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_cookie_header_missing() {
        assert!(session_token_from_cookie_header("theme=dark; lang=en").is_none());
        assert!(session_token_from_cookie_header("").is_none());
    }

    #[test]
    fn test_session_cookie_is_http_only() {
        let cookie = session_cookie("tok");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.starts_with("rately_session=tok"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
