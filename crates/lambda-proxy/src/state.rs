use std::fmt;

use secrecy::SecretString;

/// Environment variable holding the shared access token.
pub const TOKEN_ENV: &str = "TOKEN";

/// Runtime state loaded from the environment.
///
/// Locally reads from `.env` via dotenvy; on Lambda the function's
/// environment variables are used as-is. The token is wrapped in
/// [`SecretString`] so it never shows up in `Debug` output or logs.
#[derive(Clone, Default)]
pub struct ProxyState {
    /// Expected `access_token` query parameter for routes with `token = true`.
    /// `None` means every token check fails.
    pub token: Option<SecretString>,
}

impl fmt::Debug for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyState")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProxyState {
    /// Load state from environment variables.
    pub fn load() -> Self {
        let dotenv_loaded = dotenvy::dotenv().is_ok();
        tracing::debug!(dotenv = dotenv_loaded, "loading ProxyState");

        let state = Self {
            token: std::env::var(TOKEN_ENV)
                .ok()
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
        };

        tracing::debug!(
            token_configured = state.token.is_some(),
            "ProxyState loaded"
        );
        state
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(SecretString::from(token.into())),
        }
    }
}
