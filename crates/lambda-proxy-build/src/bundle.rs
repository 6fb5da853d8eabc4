use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// Directory (under the project root) the build context is assembled in.
pub const BUNDLE_DIR: &str = ".lambda-proxy-bundle";

/// Path components never copied into the build context,
/// regardless of .gitignore content.
const ALWAYS_EXCLUDED: &[&str] = &[BUNDLE_DIR, crate::eject::EJECT_DIR, ".git"];

/// A generated file written into the bundle after the sources.
#[derive(Debug, Clone)]
pub struct BundleFile<'a> {
    /// Path relative to the bundle root
    pub path: &'a str,
    pub content: &'a str,
}

/// Assembles the docker build context.
///
/// Uses `git ls-files` under `source_root` to respect `.gitignore`, copies
/// every tracked and untracked-but-not-ignored file into
/// `<project_dir>/.lambda-proxy-bundle/`, then writes the Dockerfile and any
/// generated files on top.
pub fn create_bundle(
    project_dir: &Path,
    source_root: &Path,
    dockerfile_content: &str,
    generated: &[BundleFile<'_>],
) -> Result<PathBuf, BundleError> {
    let bundle_dir = project_dir.join(BUNDLE_DIR);

    remove_bundle(project_dir)?;
    std::fs::create_dir_all(&bundle_dir).map_err(|e| BundleError::Create {
        path: bundle_dir.clone(),
        source: e,
    })?;

    let files = git_ls_files(source_root)?;
    let mut copied = 0usize;

    for relative_path in &files {
        if is_excluded(relative_path) {
            continue;
        }

        let src = source_root.join(relative_path);
        // Deleted-but-tracked files are still listed by git
        if !src.is_file() {
            tracing::debug!(path = %relative_path.display(), "skipping missing file");
            continue;
        }
        let dst = bundle_dir.join(relative_path);
        ensure_parent(&dst)?;

        std::fs::copy(&src, &dst).map_err(|e| BundleError::CopyFile {
            path: src,
            source: e,
        })?;
        copied += 1;
    }

    let dockerfile_path = bundle_dir.join("Dockerfile");
    std::fs::write(&dockerfile_path, dockerfile_content).map_err(|e| BundleError::WriteFile {
        path: dockerfile_path.clone(),
        source: e,
    })?;

    for file in generated {
        let path = bundle_dir.join(file.path);
        ensure_parent(&path)?;
        std::fs::write(&path, file.content).map_err(|e| BundleError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        set_executable(&path)?;
    }

    tracing::debug!(
        bundle = %bundle_dir.display(),
        files = copied,
        generated = generated.len(),
        "build context assembled"
    );

    Ok(bundle_dir)
}

/// Remove the bundle directory if present. Returns whether anything was removed.
pub fn remove_bundle(project_dir: &Path) -> Result<bool, BundleError> {
    let bundle_dir = project_dir.join(BUNDLE_DIR);
    if !bundle_dir.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(&bundle_dir).map_err(|e| BundleError::Cleanup {
        path: bundle_dir,
        source: e,
    })?;
    Ok(true)
}

fn is_excluded(relative_path: &Path) -> bool {
    relative_path.components().any(|c| match c {
        Component::Normal(name) => ALWAYS_EXCLUDED.iter().any(|ex| name == *ex),
        _ => false,
    })
}

fn ensure_parent(path: &Path) -> Result<(), BundleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BundleError::Create {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), BundleError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
        BundleError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), BundleError> {
    Ok(())
}

/// Files git would ship: tracked plus untracked-but-not-ignored.
fn git_ls_files(source_root: &Path) -> Result<Vec<PathBuf>, BundleError> {
    let stdout = git(
        source_root,
        &["ls-files", "--cached", "--others", "--exclude-standard"],
    )?;
    Ok(String::from_utf8_lossy(&stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Whether the working tree under `source_root` has uncommitted changes.
pub fn is_dirty(source_root: &Path) -> Result<bool, BundleError> {
    git(source_root, &["status", "--porcelain"]).map(|stdout| !stdout.is_empty())
}

fn git(dir: &Path, args: &[&str]) -> Result<Vec<u8>, BundleError> {
    let command = format!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| BundleError::GitSpawn {
            command: command.clone(),
            source,
        })?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(BundleError::GitFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to clean up bundle directory {path}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to create directory {path}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy file {path}")]
    CopyFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not run `{command}`; is git installed?")]
    GitSpawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` {status}: {stderr}")]
    GitFailed {
        command: String,
        status: String,
        stderr: String,
    },
}
