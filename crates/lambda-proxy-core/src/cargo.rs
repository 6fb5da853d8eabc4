//! Function package discovery via `cargo metadata`.
//!
//! The packaging image runs `cargo install --path <package>` from a copy of
//! the workspace, so we need the package directory relative to the
//! workspace root and the binary to install. Both come from the official
//! metadata protocol, which handles workspace inheritance and
//! `default-run` for us.

use cargo_metadata::{Metadata, MetadataCommand, Package};
use std::path::{Path, PathBuf};

/// Binary name conventionally used by Lambda custom runtimes.
pub const BOOTSTRAP_BINARY: &str = "bootstrap";

/// The Cargo package that holds the Lambda function.
///
/// # Construction
///
/// Use [`FunctionProject::discover()`] on a real project. Direct struct
/// construction is fine in tests, but `handler_binary` must name one of
/// `binaries`.
///
/// ```no_run
/// use lambda_proxy_core::FunctionProject;
/// use std::path::Path;
///
/// let project = FunctionProject::discover(Path::new("."), None).unwrap();
/// println!("Packaging {} ({})", project.name, project.handler_binary);
/// ```
#[derive(Debug, Clone)]
pub struct FunctionProject {
    /// Package name from `[package].name`
    pub name: String,
    /// Resolved version (handles `version.workspace = true`)
    pub version: String,
    /// Absolute path to the package directory
    pub package_dir: PathBuf,
    /// Absolute path to the workspace root directory
    pub workspace_root: PathBuf,
    /// Names of all binary targets in this package
    pub binaries: Vec<String>,
    /// The binary installed into the image.
    ///
    /// **Invariant:** must match a name in [`binaries`](Self::binaries).
    pub handler_binary: String,
}

impl FunctionProject {
    /// Discover the function package at `project_dir`.
    ///
    /// `requested` is the `[package].binary` value from `lambda-proxy.toml`;
    /// when set it must name a binary target of the package.
    ///
    /// # Errors
    ///
    /// - [`Error::Metadata`](crate::Error::Metadata) if `cargo metadata` fails
    /// - [`Error::NotAPackage`](crate::Error::NotAPackage) if `project_dir` has no `[package]`
    /// - [`Error::NoBinaryTarget`](crate::Error::NoBinaryTarget) if the package has no binaries
    /// - [`Error::MultipleBinaries`](crate::Error::MultipleBinaries) if the choice is ambiguous
    /// - [`Error::UnknownBinary`](crate::Error::UnknownBinary) if `requested` is not a target
    pub fn discover(project_dir: &Path, requested: Option<&str>) -> crate::Result<Self> {
        let package_dir = project_dir
            .canonicalize()
            .map_err(|source| crate::Error::ProjectDir {
                path: project_dir.to_path_buf(),
                source,
            })?;
        let metadata = load_metadata(&package_dir.join("Cargo.toml"))?;
        let package = package_at(&metadata, &package_dir)?;

        let binaries = bin_targets(package);
        let handler_binary = Self::select_handler_binary(
            &binaries,
            requested,
            package.default_run.as_deref(),
            &package.name,
        )?;

        let project = Self {
            name: package.name.to_string(),
            version: package.version.to_string(),
            package_dir,
            workspace_root: metadata.workspace_root.clone().into_std_path_buf(),
            binaries,
            handler_binary,
        };
        tracing::debug!(
            package = %project.name,
            binary = %project.handler_binary,
            workspace = %project.workspace_root.display(),
            "found function package"
        );
        Ok(project)
    }

    /// Package directory relative to the workspace root, with `/` separators.
    ///
    /// Empty when the package is the workspace root itself.
    pub fn relative_package_dir(&self) -> String {
        let relative = self
            .package_dir
            .strip_prefix(&self.workspace_root)
            .unwrap_or(Path::new(""));
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Select the binary to install into the image.
    ///
    /// Priority:
    /// 1. `[package].binary` from lambda-proxy.toml (must exist)
    /// 2. `default-run` from Cargo.toml
    /// 3. A binary named `bootstrap` (custom runtime convention)
    /// 4. Single binary
    /// 5. Binary matching the package name
    /// 6. Error with guidance
    fn select_handler_binary(
        binaries: &[String],
        requested: Option<&str>,
        default_run: Option<&str>,
        package_name: &str,
    ) -> crate::Result<String> {
        let has = |name: &str| binaries.iter().any(|b| b == name);

        if let Some(name) = requested {
            if has(name) {
                return Ok(name.to_owned());
            }
            return Err(crate::Error::UnknownBinary {
                name: name.to_owned(),
                available: binaries.to_vec(),
            });
        }

        if let Some(name) = default_run
            && has(name)
        {
            return Ok(name.to_owned());
        }

        if has(BOOTSTRAP_BINARY) {
            return Ok(BOOTSTRAP_BINARY.to_owned());
        }

        match binaries.len() {
            0 => Err(crate::Error::NoBinaryTarget {
                package: package_name.to_owned(),
            }),
            1 => Ok(binaries[0].clone()),
            _ if has(package_name) => Ok(package_name.to_owned()),
            _ => Err(crate::Error::MultipleBinaries {
                names: binaries.to_vec(),
            }),
        }
    }
}

fn load_metadata(manifest: &Path) -> crate::Result<Metadata> {
    tracing::debug!(manifest = %manifest.display(), "reading cargo metadata");
    MetadataCommand::new()
        .manifest_path(manifest)
        .no_deps()
        .exec()
        .map_err(|e| crate::Error::Metadata {
            manifest_path: manifest.to_path_buf(),
            detail: e.to_string(),
        })
}

/// The package whose manifest sits directly in `dir` (already canonical).
fn package_at<'m>(metadata: &'m Metadata, dir: &Path) -> crate::Result<&'m Package> {
    let in_dir = |package: &&Package| {
        package
            .manifest_path
            .parent()
            .and_then(|parent| parent.canonicalize().ok())
            .is_some_and(|parent| parent == dir)
    };

    metadata
        .packages
        .iter()
        .find(in_dir)
        .ok_or_else(|| crate::Error::NotAPackage {
            dir: dir.to_path_buf(),
            workspace_members: metadata
                .workspace_packages()
                .into_iter()
                .map(|p| p.name.to_string())
                .collect(),
        })
}

fn bin_targets(package: &Package) -> Vec<String> {
    package
        .targets
        .iter()
        .filter(|target| target.is_bin())
        .map(|target| target.name.clone())
        .collect()
}
