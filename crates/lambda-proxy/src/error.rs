#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("duplicate route detected: \"{path}\"; URL paths must be unique")]
    DuplicateRoute { path: String },

    #[error("invalid route pattern \"{pattern}\": {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unknown compression method: {0}")]
    UnknownCompression(String),
}
