use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "lambda-proxy.toml";

/// lambda-proxy.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub container: ContainerConfig,
    #[serde(default)]
    pub package: PackageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Tag of the image produced by `docker build`
    #[serde(default = "default_image_tag")]
    pub tag: String,
    /// Base image the function is compiled in
    #[serde(default = "default_base_image")]
    pub base_image: String,
    /// Additional system packages to install via apt-get
    #[serde(default)]
    pub extra_packages: Vec<String>,
    /// Static environment variables baked into the image.
    /// These become ENV directives in the Dockerfile.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Name given to the packaging container
    #[serde(default = "default_container_name")]
    pub name: String,
    /// Working directory inside the image and container
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Installation base (`CARGO_INSTALL_ROOT`) the binary is installed under
    #[serde(default = "default_install_base")]
    pub install_base: String,
    /// Where the project directory is mounted inside the container
    #[serde(default = "default_mount")]
    pub mount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Packaging script, relative to the project root
    #[serde(default = "default_script")]
    pub script: String,
    /// Archive the script writes under the mount point
    #[serde(default = "default_artifact")]
    pub artifact: String,
    /// Binary to package (defaults to Cargo-based selection)
    #[serde(default)]
    pub binary: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            tag: default_image_tag(),
            base_image: default_base_image(),
            extra_packages: Vec::new(),
            env: HashMap::new(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: default_container_name(),
            workdir: default_workdir(),
            install_base: default_install_base(),
            mount: default_mount(),
        }
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            script: default_script(),
            artifact: default_artifact(),
            binary: None,
        }
    }
}

impl ProxyConfig {
    /// Load from lambda-proxy.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.clone(),
                source: e,
            })?;
        let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path.clone(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce a broken `docker run` or script path.
    pub fn validate(&self) -> crate::Result<()> {
        let script = Path::new(&self.package.script);
        if self.package.script.trim().is_empty() {
            return Err(crate::Error::InvalidScriptPath {
                path: self.package.script.clone(),
                reason: "must not be empty",
            });
        }
        if script.is_absolute() {
            return Err(crate::Error::InvalidScriptPath {
                path: self.package.script.clone(),
                reason: "must be relative to the project root",
            });
        }
        if script
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(crate::Error::InvalidScriptPath {
                path: self.package.script.clone(),
                reason: "must not leave the project root",
            });
        }

        for (field, value) in [
            ("container.workdir", &self.container.workdir),
            ("container.install_base", &self.container.install_base),
            ("container.mount", &self.container.mount),
        ] {
            if !value.starts_with('/') {
                return Err(crate::Error::InvalidContainerPath {
                    field,
                    value: value.clone(),
                });
            }
        }

        if self.container.name.trim().is_empty() {
            return Err(crate::Error::EmptyContainerName);
        }

        Ok(())
    }
}

fn default_image_tag() -> String {
    "lambda-proxy:latest".to_owned()
}

fn default_base_image() -> String {
    "rust:1.84-bullseye".to_owned()
}

fn default_container_name() -> String {
    "lambda-proxy".to_owned()
}

fn default_workdir() -> String {
    "/var/task".to_owned()
}

fn default_install_base() -> String {
    "/var/task".to_owned()
}

fn default_mount() -> String {
    "/local".to_owned()
}

fn default_script() -> String {
    "bin/package.sh".to_owned()
}

fn default_artifact() -> String {
    "package.zip".to_owned()
}
