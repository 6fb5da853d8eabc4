use lambda_proxy_core::{FunctionProject, ProxyConfig};

/// Directory the build context is copied to inside the image.
/// Removed again in the same layer that installs the binary.
pub const SOURCE_DIR: &str = "/tmp/lambda-proxy-src";

/// Renders the packaging image definition.
///
/// The image compiles the function once and installs it under the
/// configured installation base (`CARGO_INSTALL_ROOT`); the sources never
/// survive into the final layer.
pub struct DockerfileGenerator<'a> {
    config: &'a ProxyConfig,
    project: &'a FunctionProject,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(config: &'a ProxyConfig, project: &'a FunctionProject) -> Self {
        Self { config, project }
    }

    pub fn render(&self) -> String {
        let image = &self.config.image;
        let container = &self.config.container;

        let mut packages = vec!["zip".to_owned()];
        packages.extend(
            image
                .extra_packages
                .iter()
                .filter(|p| p.as_str() != "zip")
                .cloned(),
        );

        let mut env: Vec<(&String, &String)> = image.env.iter().collect();
        env.sort();
        let env_lines: String = env
            .iter()
            .map(|(k, v)| format!("ENV {k}=\"{}\"\n", escape_env_value(v)))
            .collect();

        let relative = self.project.relative_package_dir();
        let install_path = if relative.is_empty() {
            SOURCE_DIR.to_owned()
        } else {
            format!("{SOURCE_DIR}/{relative}")
        };

        format!(
            r#"# === lambda-proxy packaging image ===
FROM {base}
WORKDIR {workdir}
ENV CARGO_INSTALL_ROOT={install_base}
{env_lines}RUN apt-get update && apt-get install -y {packages} && rm -rf /var/lib/apt/lists/*

# === Install {binary} from a throwaway copy of the sources ===
COPY . {source_dir}
RUN cargo install --locked --path {install_path} --bin {binary} \
    && rm -rf {source_dir}
"#,
            base = image.base_image,
            workdir = container.workdir,
            install_base = container.install_base,
            env_lines = env_lines,
            packages = packages.join(" "),
            binary = self.project.handler_binary,
            source_dir = SOURCE_DIR,
            install_path = install_path,
        )
    }
}

fn escape_env_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
