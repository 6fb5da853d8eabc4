use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};
use lambda_proxy_core::ProxyConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// Everything `docker run` needs to start the packaging container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub workdir: String,
    /// Host directory mounted into the container
    pub host_dir: PathBuf,
    /// Mount point of `host_dir` inside the container
    pub mount: String,
}

impl ContainerSpec {
    pub fn from_config(config: &ProxyConfig, host_dir: &Path) -> Self {
        Self {
            name: config.container.name.clone(),
            image: config.image.tag.clone(),
            workdir: config.container.workdir.clone(),
            host_dir: host_dir.to_path_buf(),
            mount: config.container.mount.clone(),
        }
    }
}

/// Docker operations client, parameterized over the executor for testability.
pub struct DockerClient<E: DockerExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DockerExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    pub async fn doctor(&self, base_image: &str) -> DoctorReport {
        let mut report = DoctorReport::default();

        match self
            .executor
            .exec(&args(["version", "--format", "{{.Client.Version}}"]))
            .await
        {
            Ok(v) => report.docker = CheckResult::ok(v.trim()),
            Err(e) => report.docker = CheckResult::fail(&e.to_string()),
        }

        match self
            .executor
            .exec(&args(["info", "--format", "{{.ServerVersion}}"]))
            .await
        {
            Ok(v) if !v.trim().is_empty() => report.daemon = CheckResult::ok(v.trim()),
            _ => {
                report.daemon = CheckResult::fail("daemon not reachable");
                return report;
            }
        }

        report.base_image = if self.image_exists(base_image).await {
            CheckResult::ok(&format!("{base_image} (present)"))
        } else {
            CheckResult::ok(&format!("{base_image} (pulled on first build)"))
        };

        report
    }

    /// Whether an image is present in the local image store.
    pub async fn image_exists(&self, image: &str) -> bool {
        self.executor
            .exec(&args(["image", "inspect", "--format", "{{.Id}}", image]))
            .await
            .is_ok()
    }

    // ── Image ──

    /// `docker build --tag <tag> <context>`.
    ///
    /// `capture`: when `true` the build output is returned instead of
    /// streamed to the terminal.
    pub async fn build_image(
        &self,
        context_dir: &Path,
        tag: &str,
        capture: bool,
    ) -> Result<Option<String>, BuildError> {
        let context = context_dir
            .to_str()
            .ok_or_else(|| BuildError::InvalidPath(context_dir.to_path_buf()))?;
        let cmd = args(["build", "--tag", tag, context]);

        tracing::info!(tag, context, "building image");
        if capture {
            let output = self
                .executor
                .exec(&cmd)
                .await
                .map_err(|e| BuildError::Build { source: e })?;
            Ok(Some(output))
        } else {
            self.executor
                .exec_streaming(&cmd)
                .await
                .map_err(|e| BuildError::Build { source: e })?;
            Ok(None)
        }
    }

    // ── Container ──

    /// Whether a container (running or not) with exactly this name exists.
    pub async fn container_exists(&self, name: &str) -> Result<bool, ContainerError> {
        let filter = format!("name=^/{name}$");
        let output = self
            .executor
            .exec(&args(["ps", "--all", "--quiet", "--filter", &filter]))
            .await
            .map_err(|e| ContainerError::Inspect { source: e })?;
        Ok(!output.trim().is_empty())
    }

    /// Start the packaging container detached, returning its id.
    pub async fn run_container(&self, spec: &ContainerSpec) -> Result<String, ContainerError> {
        let host_dir = spec
            .host_dir
            .to_str()
            .ok_or_else(|| ContainerError::InvalidPath(spec.host_dir.clone()))?;
        let volume = format!("{host_dir}:{}", spec.mount);

        let id = self
            .executor
            .exec(&args([
                "run",
                "--name",
                &spec.name,
                "--workdir",
                &spec.workdir,
                "--volume",
                &volume,
                "--detach",
                "--tty",
                &spec.image,
                "/bin/bash",
            ]))
            .await
            .map_err(|e| ContainerError::Run { source: e })?;

        Ok(id.trim().to_owned())
    }

    /// Run the packaging script inside the container, streaming its output.
    pub async fn exec_script(&self, name: &str, script_path: &str) -> Result<(), ContainerError> {
        self.executor
            .exec_streaming(&args(["exec", name, "/bin/bash", script_path]))
            .await
            .map_err(|e| ContainerError::Exec {
                script: script_path.to_owned(),
                source: e,
            })
    }

    pub async fn stop_container(&self, name: &str) -> Result<(), ContainerError> {
        self.executor
            .exec(&args(["stop", name]))
            .await
            .map_err(|e| ContainerError::Stop { source: e })?;
        Ok(())
    }

    pub async fn remove_container(&self, name: &str) -> Result<(), ContainerError> {
        self.executor
            .exec(&args(["rm", name]))
            .await
            .map_err(|e| ContainerError::Remove { source: e })?;
        Ok(())
    }

    /// Remove a container left behind by an interrupted run.
    /// Returns whether one was found.
    pub async fn remove_stale_container(&self, name: &str) -> Result<bool, ContainerError> {
        if !self.container_exists(name).await? {
            return Ok(false);
        }
        tracing::warn!(container = name, "removing leftover container");
        self.executor
            .exec(&args(["rm", "--force", name]))
            .await
            .map_err(|e| ContainerError::Remove { source: e })?;
        Ok(true)
    }

    /// Run → exec → stop → rm.
    ///
    /// Stop and remove always run once the container has started, and a
    /// container created by a failed `docker run` is force-removed, so no
    /// container named `spec.name` outlives this call. The first failure
    /// is returned; a teardown failure after a script failure is logged.
    pub async fn run_packaging(
        &self,
        spec: &ContainerSpec,
        script_path: &str,
    ) -> Result<(), ContainerError> {
        self.remove_stale_container(&spec.name).await?;

        // `docker run` creates the container before starting it
        let id = match self.run_container(spec).await {
            Ok(id) => id,
            Err(run_err) => {
                if let Err(e) = self.remove_stale_container(&spec.name).await {
                    tracing::error!(
                        container = %spec.name,
                        error = %e,
                        "cleanup failed after run failure"
                    );
                }
                return Err(run_err);
            }
        };
        tracing::info!(container = %spec.name, id = %id, "container started");

        let script_result = self.exec_script(&spec.name, script_path).await;
        let teardown_result = self.teardown(&spec.name).await;

        match (script_result, teardown_result) {
            (Ok(()), teardown) => teardown,
            (Err(script_err), Ok(())) => Err(script_err),
            (Err(script_err), Err(teardown_err)) => {
                tracing::error!(
                    container = %spec.name,
                    error = %teardown_err,
                    "teardown failed after script failure"
                );
                Err(script_err)
            }
        }
    }

    async fn teardown(&self, name: &str) -> Result<(), ContainerError> {
        let stopped = self.stop_container(name).await;
        if let Err(e) = &stopped {
            tracing::warn!(container = name, error = %e, "stop failed; removing anyway");
        }
        // rm after a failed stop needs --force to take a running container
        let removed = if stopped.is_ok() {
            self.remove_container(name).await
        } else {
            self.executor
                .exec(&args(["rm", "--force", name]))
                .await
                .map(|_| ())
                .map_err(|e| ContainerError::Remove { source: e })
        };
        if removed.is_ok() {
            tracing::info!(container = name, "container removed");
        }
        stopped.and(removed)
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub docker: CheckResult,
    pub daemon: CheckResult,
    pub base_image: CheckResult,
    pub config_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.docker.passed && self.daemon.passed && self.base_image.passed && self.config_file.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("Docker CLI", &self.docker),
            ("Docker daemon", &self.daemon),
            ("Base image", &self.base_image),
            ("Config file", &self.config_file),
        ];
        for (label, check) in rows {
            writeln!(f, "  [{}] {label:<14} {}", check.icon(), check.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build context path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("docker build failed")]
    Build { source: DockerError },
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("mount path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("failed to inspect containers")]
    Inspect { source: DockerError },

    #[error("failed to start packaging container")]
    Run { source: DockerError },

    #[error("packaging script {script} failed")]
    Exec { script: String, source: DockerError },

    #[error("failed to stop packaging container")]
    Stop { source: DockerError },

    #[error("failed to remove packaging container")]
    Remove { source: DockerError },
}
