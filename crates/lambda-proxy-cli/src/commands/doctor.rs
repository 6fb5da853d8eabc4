use lambda_proxy_core::{CONFIG_FILE, ProxyConfig};
use lambda_proxy_docker::{CheckResult, DockerClient};
use std::path::Path;

pub async fn doctor() -> anyhow::Result<()> {
    let loaded = ProxyConfig::load(Path::new("."));
    let base_image = loaded
        .as_ref()
        .map(|c| c.image.base_image.clone())
        .unwrap_or_else(|_| ProxyConfig::default().image.base_image);

    let client = DockerClient::new();
    let mut report = client.doctor(&base_image).await;

    report.config_file = match (&loaded, Path::new(CONFIG_FILE).exists()) {
        (Ok(_), true) => CheckResult::ok("Found"),
        (Ok(_), false) => CheckResult::ok("Not found, using defaults"),
        (Err(e), _) => CheckResult::fail(&e.to_string()),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed, see above for details");
    }

    Ok(())
}
