use std::path::{Path, PathBuf};

/// Directory holding ejected build files, relative to the project root.
pub const EJECT_DIR: &str = ".lambda-proxy";

/// Ejected packaging script, relative to the project root.
pub const EJECTED_SCRIPT: &str = ".lambda-proxy/package.sh";

/// Ejects the Dockerfile and packaging script into `.lambda-proxy/`.
///
/// After ejecting, `lambda-proxy package` uses these files instead of
/// generating them. A project script at `[package].script` still wins
/// over the ejected one.
pub fn eject(
    project_dir: &Path,
    dockerfile_content: &str,
    script_content: &str,
) -> Result<Vec<PathBuf>, EjectError> {
    let eject_dir = project_dir.join(EJECT_DIR);
    let dockerfile_path = eject_dir.join("Dockerfile");
    if dockerfile_path.exists() {
        return Err(EjectError::AlreadyEjected(dockerfile_path));
    }

    std::fs::create_dir_all(&eject_dir).map_err(|e| EjectError::CreateDir {
        path: eject_dir.clone(),
        source: e,
    })?;

    std::fs::write(&dockerfile_path, dockerfile_content).map_err(|e| EjectError::Write {
        path: dockerfile_path.clone(),
        source: e,
    })?;

    let mut written = vec![dockerfile_path];

    let script_path = project_dir.join(EJECTED_SCRIPT);
    if script_path.exists() {
        tracing::info!(path = %script_path.display(), "keeping existing ejected script");
    } else {
        std::fs::write(&script_path, script_content).map_err(|e| EjectError::Write {
            path: script_path.clone(),
            source: e,
        })?;
        written.push(script_path);
    }

    Ok(written)
}

/// Check if the project has an ejected Dockerfile.
pub fn is_ejected(project_dir: &Path) -> bool {
    project_dir.join(EJECT_DIR).join("Dockerfile").exists()
}

/// Check if the project has an ejected packaging script.
pub fn ejected_script_exists(project_dir: &Path) -> bool {
    project_dir.join(EJECTED_SCRIPT).is_file()
}

/// Load ejected Dockerfile content.
pub fn load_ejected_dockerfile(project_dir: &Path) -> Result<String, EjectError> {
    let path = project_dir.join(EJECT_DIR).join("Dockerfile");
    std::fs::read_to_string(&path).map_err(|e| EjectError::Read { path, source: e })
}

#[derive(Debug, thiserror::Error)]
pub enum EjectError {
    #[error("failed to create {path}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("build files already ejected at {0}; edit them directly or delete to re-eject")]
    AlreadyEjected(PathBuf),
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read ejected Dockerfile at {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}
