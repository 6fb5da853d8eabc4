use secrecy::ExposeSecret;

use crate::state::ProxyState;

/// Query parameter carrying the access token.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Check a request's `access_token` against the configured token.
///
/// Fails when either side is missing or empty.
pub fn validate_token(state: &ProxyState, provided: Option<&str>) -> bool {
    let Some(expected) = state.token.as_ref() else {
        tracing::warn!("token required but {} is not configured", crate::state::TOKEN_ENV);
        return false;
    };
    match provided {
        Some(token) if !token.is_empty() => {
            constant_time_eq(token.as_bytes(), expected.expose_secret().as_bytes())
        }
        _ => false,
    }
}

/// Constant-time byte comparison to prevent timing attacks on token validation.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
