use lambda_proxy_build::{DockerfileGenerator, ScriptGenerator};
use lambda_proxy_core::{FunctionProject, ProxyConfig};
use std::path::PathBuf;

pub async fn eject() -> anyhow::Result<()> {
    let project_dir = PathBuf::from(".");
    let config = ProxyConfig::load(&project_dir)?;
    let project = FunctionProject::discover(&project_dir, config.package.binary.as_deref())?;

    let dockerfile = DockerfileGenerator::new(&config, &project).render();
    let script = ScriptGenerator::new(&config, &project).render();

    let written = lambda_proxy_build::eject::eject(&project_dir, &dockerfile, &script)?;

    for path in &written {
        println!("Ejected {}", path.display());
    }
    println!("You can now edit them directly. lambda-proxy package will use these files.");
    Ok(())
}
