use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid package script path {path:?}: {reason}")]
    InvalidScriptPath { path: String, reason: &'static str },

    #[error("{field} must be an absolute container path, got {value:?}")]
    InvalidContainerPath { field: &'static str, value: String },

    #[error("container.name must not be empty")]
    EmptyContainerName,

    // ── Cargo project discovery ──
    #[error("cargo metadata failed for {manifest_path}: {detail}")]
    Metadata {
        manifest_path: PathBuf,
        detail: String,
    },

    #[error("failed to resolve project directory {path}")]
    ProjectDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "no package found in {dir}; workspace members: {}",
        format_members(workspace_members)
    )]
    NotAPackage {
        dir: PathBuf,
        workspace_members: Vec<String>,
    },

    #[error("no binary target in package '{package}'; a Lambda function needs one")]
    NoBinaryTarget { package: String },

    #[error(
        "multiple binary targets found: {}; set [package].binary in lambda-proxy.toml or `default-run` in Cargo.toml",
        names.join(", ")
    )]
    MultipleBinaries { names: Vec<String> },

    #[error(
        "binary '{name}' configured in lambda-proxy.toml is not a target of this package (available: {})",
        format_members(available)
    )]
    UnknownBinary { name: String, available: Vec<String> },
}

fn format_members(members: &[String]) -> String {
    if members.is_empty() {
        "(none)".to_owned()
    } else {
        members.join(", ")
    }
}
