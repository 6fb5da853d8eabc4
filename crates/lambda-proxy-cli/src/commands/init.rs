use lambda_proxy_build::bundle::BUNDLE_DIR;
use lambda_proxy_core::CONFIG_FILE;
use std::path::Path;

const CONFIG_TEMPLATE: &str = r#"[image]
# tag = "lambda-proxy:latest"
# base_image = "rust:1.84-bullseye"
# extra_packages = []
# env = { RUSTFLAGS = "-C target-cpu=neoverse-n1" }

[container]
# name = "lambda-proxy"
# workdir = "/var/task"
# install_base = "/var/task"
# mount = "/local"

[package]
# script = "bin/package.sh"
# artifact = "package.zip"
# binary = "bootstrap"
"#;

/// Initialize lambda-proxy in an existing Rust project.
pub async fn init_project() -> anyhow::Result<()> {
    if !Path::new("Cargo.toml").exists() {
        anyhow::bail!("Cargo.toml not found. Run this command from a Rust project root.");
    }

    let mut created = Vec::new();

    let config_path = Path::new(CONFIG_FILE);
    if config_path.exists() {
        eprintln!("{CONFIG_FILE} already exists, skipping");
    } else {
        std::fs::write(config_path, CONFIG_TEMPLATE)?;
        created.push(CONFIG_FILE.to_owned());
    }

    // Build outputs must not make the tree dirty for the next run
    let ignored = [format!("/{BUNDLE_DIR}/"), "/package.zip".to_owned()];
    let gitignore_path = Path::new(".gitignore");
    let existing = if gitignore_path.exists() {
        std::fs::read_to_string(gitignore_path)?
    } else {
        String::new()
    };
    let missing: Vec<&String> = ignored
        .iter()
        .filter(|entry| !existing.lines().any(|line| line.trim() == entry.as_str()))
        .collect();
    if !missing.is_empty() {
        let mut content = existing.clone();
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        for entry in missing {
            content.push_str(entry);
            content.push('\n');
        }
        std::fs::write(gitignore_path, content)?;
        created.push(".gitignore entries".to_owned());
    }

    if created.is_empty() {
        println!("Nothing to create, already initialized.");
    } else {
        for f in &created {
            println!("Created {f}");
        }
    }

    println!();
    println!("Next steps:");
    println!();
    println!("  1. Add the router:");
    println!("     cargo add lambda-proxy");
    println!();
    println!("  2. Name your binary `bootstrap` or set [package].binary in {CONFIG_FILE}");
    println!();
    println!("  3. Register views:");
    println!();
    println!("     use lambda_proxy::{{Api, Reply, RouteOptions, Status}};");
    println!();
    println!("     let mut api = Api::new(\"app\");");
    println!("     api.route(\"/\", RouteOptions::new().cors(true), |_| {{");
    println!("         Ok(Reply::new(Status::Ok, \"text/plain\", \"Yo\"))");
    println!("     }})?;");
    println!("     api.run().await");
    println!();
    println!("  4. Package:");
    println!("     lambda-proxy package");

    Ok(())
}
