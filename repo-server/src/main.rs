//! Maven repository server CLI binary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repo_logging::{init_subscriber, LogSettings};
use repo_server::{
    checksum_line, run_server, ChecksumAlgorithm, Config, FsStore, Repository,
};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "maven-repo")]
#[command(about = "Maven repository server - hosts and serves build artifacts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the repository server
    Serve {
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,

        /// Repository root directory
        #[arg(long)]
        data: Option<PathBuf>,

        /// Path prefix the repository is served under
        #[arg(long)]
        mount: Option<String>,

        /// Reject uploads
        #[arg(long)]
        read_only: bool,
    },

    /// Scan a repository directory and print what it contains
    Scan {
        /// Repository root directory
        #[arg(long, default_value = "./repository")]
        data: PathBuf,

        /// Only look at the top-level directory
        #[arg(long)]
        no_recursive: bool,
    },

    /// Print the checksum line for a file
    Checksum {
        file: PathBuf,

        #[arg(long, value_enum, default_value = "sha1")]
        algorithm: ChecksumAlgorithm,
    },
}

fn load_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data: Option<PathBuf>,
    mount: Option<String>,
    read_only: bool,
) -> Result<Config> {
    let mut config = match config {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default("config.json")?,
    };
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(data) = data {
        config.storage.root = data;
    }
    if let Some(mount) = mount {
        config.server.mount = mount;
    }
    if read_only {
        config.storage.read_only = true;
    }
    Ok(config)
}

fn scan(data: PathBuf, recursive: bool) -> Result<()> {
    let store = FsStore::open(&data, true)?;
    let repository = Repository::new(Arc::new(store));
    let found = repository.scan_with(recursive)?;

    println!("📂 {} ({} artifacts)", data.display(), found);
    for group in repository.list_groups() {
        println!("{}", group);
        for artifact in repository.list_artifacts(&group) {
            println!("  {}", artifact);
            for version in repository.list_versions(&group, &artifact) {
                println!("    {}", version);
            }
        }
    }
    Ok(())
}

fn checksum(file: PathBuf, algorithm: ChecksumAlgorithm) -> Result<()> {
    let mut reader =
        File::open(&file).with_context(|| format!("Failed to open {}", file.display()))?;
    let hex = algorithm.hash_reader(&mut reader)?;
    let directory = file
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("{}", checksum_line(&hex, &directory, &name));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = init_subscriber(&LogSettings::from_env());

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            data,
            mount,
            read_only,
        } => run_server(load_config(config, host, port, data, mount, read_only)?).await,

        Commands::Scan { data, no_recursive } => scan(data, !no_recursive),

        Commands::Checksum { file, algorithm } => checksum(file, algorithm),
    }
}
