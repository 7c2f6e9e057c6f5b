use crate::server::ServerState;
use axum::{
    extract::{Request, State},
    http::{
        HeaderValue, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

const BASIC_SCHEME: &str = "basic";
const CHALLENGE: &str = r#"Basic realm="tillsync""#;

/// Lets the request through only when its Basic credential equals the
/// configured token.
pub async fn require_basic(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Response {
    let verdict = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(basic_token)
        .map(|token| constant_time_eq(token.as_bytes(), state.credential_token.as_bytes()));

    match verdict {
        Some(true) => next.run(request).await,
        Some(false) => {
            warn!(uri = %request.uri(), "Rejected request with wrong credential");
            unauthorized()
        }
        None => {
            warn!(uri = %request.uri(), "Rejected request without Basic credential");
            unauthorized()
        }
    }
}

/// The encoded credential from an `Authorization` value. The scheme name is
/// matched case-insensitively.
fn basic_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case(BASIC_SCHEME)
        .then(|| token.trim())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn unauthorized() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE));
    response
}
