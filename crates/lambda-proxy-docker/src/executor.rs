use std::io;
use std::process::Stdio;

use tokio::process::Command;

use crate::docker::DockerError;

/// Runs `docker <args>`.
///
/// [`DockerClient`](crate::client::DockerClient) goes through this trait so
/// tests can script daemon responses with mockall.
#[allow(async_fn_in_trait)]
pub trait DockerExecutor: Send + Sync {
    /// Short commands whose stdout is the result: `ps`, `run --detach`
    /// (prints the container id), `stop`, `rm`, `version`, `info`.
    async fn exec(&self, args: &[String]) -> Result<String, DockerError>;

    /// Long-running commands whose output belongs to the user: `build` and
    /// the `exec` of the packaging script. Output goes straight to the
    /// terminal, so a failure carries only the exit status.
    async fn exec_streaming(&self, args: &[String]) -> Result<(), DockerError>;
}

/// Executor backed by the `docker` binary on `PATH`.
pub struct RealExecutor;

impl DockerExecutor for RealExecutor {
    async fn exec(&self, args: &[String]) -> Result<String, DockerError> {
        tracing::debug!(?args, "docker");
        let output = docker(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        String::from_utf8(output.stdout).map_err(|source| DockerError::InvalidUtf8 { source })
    }

    async fn exec_streaming(&self, args: &[String]) -> Result<(), DockerError> {
        tracing::debug!(?args, "docker (streaming)");
        let status = docker(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(spawn_error)?;

        if status.success() {
            Ok(())
        } else {
            Err(DockerError::CommandFailed {
                args: args.to_vec(),
                stderr: format!("{status}; see output above"),
            })
        }
    }
}

fn docker(args: &[String]) -> Command {
    let mut command = Command::new("docker");
    command.args(args).stdin(Stdio::null()).kill_on_drop(true);
    command
}

/// Only a missing binary means Docker is not installed.
fn spawn_error(source: io::Error) -> DockerError {
    if source.kind() == io::ErrorKind::NotFound {
        DockerError::NotFound { source }
    } else {
        DockerError::Spawn { source }
    }
}
