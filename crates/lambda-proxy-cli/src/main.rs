mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lambda-proxy",
    about = "Package Rust AWS Lambda functions in a Docker build container"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the image, run the packaging script in a container, write the zip
    Package {
        /// Allow packaging with uncommitted changes
        #[arg(long)]
        allow_dirty: bool,
        /// Keep .lambda-proxy-bundle/ after packaging
        #[arg(long)]
        keep_bundle: bool,
    },
    /// Eject Dockerfile and packaging script for manual customization
    Eject,
    /// Add lambda-proxy.toml to an existing Rust project
    Init,
    /// Check Docker setup and readiness
    Doctor,
    /// Remove the local bundle and any leftover packaging container
    Clean,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Package {
            allow_dirty,
            keep_bundle,
        } => commands::package(allow_dirty, keep_bundle).await?,
        Commands::Eject => commands::eject().await?,
        Commands::Init => commands::init_project().await?,
        Commands::Doctor => commands::doctor().await?,
        Commands::Clean => commands::clean().await?,
    }

    Ok(())
}
