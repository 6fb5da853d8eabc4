use lambda_proxy_build::bundle::{self, BundleFile};
use lambda_proxy_build::dockerfile::DockerfileGenerator;
use lambda_proxy_build::eject as eject_mod;
use lambda_proxy_build::script::ScriptSource;
use lambda_proxy_core::{FunctionProject, ProxyConfig};
use lambda_proxy_docker::{ContainerSpec, DockerClient};
use std::path::Path;

/// Execute the full package pipeline.
pub async fn package(allow_dirty: bool, keep_bundle: bool) -> anyhow::Result<()> {
    // Absolute: the project directory is bind-mounted into the container
    let project_dir = std::env::current_dir()?;

    // Dirty check: refuse to package uncommitted changes unless --allow-dirty
    if !allow_dirty && bundle::is_dirty(&project_dir)? {
        anyhow::bail!(
            "uncommitted changes detected.\n\
             Commit your changes, or use `lambda-proxy package --allow-dirty` to package anyway."
        );
    }

    let config = ProxyConfig::load(&project_dir)?;
    let project = FunctionProject::discover(&project_dir, config.package.binary.as_deref())?;
    tracing::info!(
        package = %project.name,
        version = %project.version,
        binary = %project.handler_binary,
        "function discovered"
    );

    let dockerfile = if eject_mod::is_ejected(&project_dir) {
        println!("Using ejected Dockerfile from .lambda-proxy/Dockerfile");
        eject_mod::load_ejected_dockerfile(&project_dir)?
    } else {
        DockerfileGenerator::new(&config, &project).render()
    };

    let script = ScriptSource::resolve(&project_dir, &config, &project);
    let generated: Vec<BundleFile<'_>> = match &script {
        ScriptSource::Generated(content) => vec![BundleFile {
            path: &config.package.script,
            content,
        }],
        ScriptSource::Project(_) | ScriptSource::Ejected(_) => Vec::new(),
    };

    println!("Bundling source...");
    let bundle_dir = bundle::create_bundle(
        &project_dir,
        &project.workspace_root,
        &dockerfile,
        &generated,
    )?;

    let result = run_in_container(&config, &project_dir, &bundle_dir, &script).await;

    // The generated script lives in the bundle, so it goes only after the run
    if keep_bundle {
        println!("Keeping bundle at {}", bundle_dir.display());
    } else if let Err(e) = bundle::remove_bundle(&project_dir) {
        tracing::warn!(error = %e, "failed to remove bundle");
    }

    result?;

    println!();
    println!(
        "Packaged: {}",
        project_dir.join(&config.package.artifact).display()
    );
    Ok(())
}

async fn run_in_container(
    config: &ProxyConfig,
    project_dir: &Path,
    bundle_dir: &Path,
    script: &ScriptSource,
) -> anyhow::Result<()> {
    let client = DockerClient::new();

    println!("Building image {}...", config.image.tag);
    client
        .build_image(bundle_dir, &config.image.tag, false)
        .await?;

    let spec = ContainerSpec::from_config(config, project_dir);
    let script_path = script.container_path(config);
    println!("Running {script_path} in container {}...", spec.name);
    client.run_packaging(&spec, &script_path).await?;

    Ok(())
}
