use lambda_proxy_build::bundle;
use lambda_proxy_core::ProxyConfig;
use lambda_proxy_docker::DockerClient;
use std::path::Path;

/// Remove `.lambda-proxy-bundle/` and a packaging container left behind
/// by an interrupted run.
pub async fn clean() -> anyhow::Result<()> {
    let project_dir = Path::new(".");
    let config = ProxyConfig::load(project_dir)?;

    if bundle::remove_bundle(project_dir)? {
        println!("Removed {}", bundle::BUNDLE_DIR);
    }

    // Best effort: Docker may be absent on the machine running clean
    let client = DockerClient::new();
    match client.remove_stale_container(&config.container.name).await {
        Ok(true) => println!("Removed container {}", config.container.name),
        Ok(false) => {}
        Err(e) => tracing::warn!(
            container = %config.container.name,
            error = %e,
            "could not check for leftover container"
        ),
    }

    println!("Clean.");
    Ok(())
}
