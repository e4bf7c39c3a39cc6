//! Session identification middleware for ember-server.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the caller's session id
pub const SESSION_HEADER: &str = "x-session-id";

/// Longest session id accepted
const MAX_SESSION_KEY_LEN: usize = 128;

/// Session context extracted from request
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_key: String,
}

/// Session middleware for axum
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(SESSION_HEADER)
        .ok_or(ApiError::MissingSession)?;

    let value = header
        .to_str()
        .map_err(|_| ApiError::InvalidSession("not valid ASCII".to_string()))?;

    let session_key = parse_session_key(value, state.config.require_uuid_session)?;

    request.extensions_mut().insert(SessionContext { session_key });

    Ok(next.run(request).await)
}

fn parse_session_key(value: &str, require_uuid: bool) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::MissingSession);
    }
    if value.len() > MAX_SESSION_KEY_LEN {
        return Err(ApiError::InvalidSession(format!(
            "longer than {} characters",
            MAX_SESSION_KEY_LEN
        )));
    }

    if require_uuid {
        let id = uuid::Uuid::parse_str(value)
            .map_err(|_| ApiError::InvalidSession("expected a UUID".to_string()))?;
        if id.get_version_num() != 4 {
            return Err(ApiError::InvalidSession("expected a v4 UUID".to_string()));
        }
        // Canonical form so differently-cased ids address one session
        return Ok(id.hyphenated().to_string());
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_key() {
        assert_eq!(parse_session_key("  abc  ", false).unwrap(), "abc");
    }

    #[test]
    fn test_parse_rejects_blank_and_long() {
        assert!(matches!(
            parse_session_key("   ", false),
            Err(ApiError::MissingSession)
        ));
        let long = "x".repeat(MAX_SESSION_KEY_LEN + 1);
        assert!(matches!(
            parse_session_key(&long, false),
            Err(ApiError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_parse_uuid_mode() {
        let id = uuid::Uuid::new_v4();
        let upper = id.hyphenated().to_string().to_uppercase();

        assert_eq!(
            parse_session_key(&upper, true).unwrap(),
            id.hyphenated().to_string()
        );
        assert!(parse_session_key("not-a-uuid", true).is_err());
        // v1-style id
        assert!(parse_session_key("c232ab00-9414-11ec-b3c8-9f6bdeced846", true).is_err());
    }
}
