//! The packaging script run inside the container.
//!
//! A project may ship its own script at `[package].script`; it is run as-is.
//! Otherwise an ejected copy under `.lambda-proxy/` is used, and failing
//! that the default script below is generated into the bundle.

use lambda_proxy_core::{FunctionProject, ProxyConfig};
use std::path::Path;

use crate::eject;

/// Where the packaging script comes from for this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Project-supplied script, path relative to the project root.
    Project(String),
    /// Ejected script, path relative to the project root.
    Ejected(String),
    /// No script on disk; this content is written into the bundle.
    Generated(String),
}

impl ScriptSource {
    /// Pick the script for `project_dir`, generating one if needed.
    pub fn resolve(project_dir: &Path, config: &ProxyConfig, project: &FunctionProject) -> Self {
        if project_dir.join(&config.package.script).is_file() {
            tracing::debug!(script = %config.package.script, "using project packaging script");
            return Self::Project(config.package.script.clone());
        }
        if eject::ejected_script_exists(project_dir) {
            tracing::debug!("using ejected packaging script");
            return Self::Ejected(eject::EJECTED_SCRIPT.to_owned());
        }
        Self::Generated(ScriptGenerator::new(config, project).render())
    }

    /// Path of the script relative to the project root once the bundle
    /// has been written.
    pub fn relative_path(&self, config: &ProxyConfig) -> String {
        match self {
            Self::Project(path) | Self::Ejected(path) => path.clone(),
            Self::Generated(_) => format!("{}/{}", crate::bundle::BUNDLE_DIR, config.package.script),
        }
    }

    /// Path of the script inside the container, under the project mount.
    pub fn container_path(&self, config: &ProxyConfig) -> String {
        join_container_path(&config.container.mount, &self.relative_path(config))
    }
}

/// Join an absolute container directory and a relative path.
pub fn join_container_path(base: &str, relative: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches("./")
    )
}

/// Renders the default `package.sh`.
pub struct ScriptGenerator<'a> {
    config: &'a ProxyConfig,
    project: &'a FunctionProject,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(config: &'a ProxyConfig, project: &'a FunctionProject) -> Self {
        Self { config, project }
    }

    pub fn render(&self) -> String {
        let archive = join_container_path(&self.config.container.mount, &self.config.package.artifact);
        format!(
            r#"#!/bin/bash
# Generated by lambda-proxy. Runs inside the packaging container.
set -euo pipefail

cd {install_base}
cp bin/{binary} bootstrap
rm -f {archive}
zip -9 -q {archive} bootstrap
echo "packaged {binary} into {archive}"
"#,
            install_base = self.config.container.install_base,
            binary = self.project.handler_binary,
            archive = archive,
        )
    }
}
