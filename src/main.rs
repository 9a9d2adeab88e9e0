use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use hostsift::config::Config;
use hostsift::init::setup_logging;
use hostsift::pipeline::{Pipeline, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "hostsift",
    version,
    about = "Merge hosts/adblock lists into one DNS-forwarder blocklist"
)]
struct Args {
    /// File listing one source URL or path per line
    #[arg(short = 's', long = "sources")]
    sources: PathBuf,

    /// Blocklist file to write
    #[arg(short = 'd', long = "destination")]
    destination: PathBuf,

    /// Keep only hosts that still resolve
    #[arg(short = 'c', long = "check", requires = "invalid")]
    check: bool,

    /// Address every blocked host is pointed at
    #[arg(long = "dip")]
    destination_ip: Option<String>,

    /// Cache of hosts found invalid on earlier runs (read and updated with -c)
    #[arg(short = 'i', long = "invalid")]
    invalid: Option<PathBuf>,

    /// Concurrent DNS checks
    #[arg(long)]
    workers: Option<usize>,

    /// Resolver address, repeatable; replaces the default set
    #[arg(long = "resolver")]
    resolvers: Vec<String>,

    /// TOML file with defaults for the options above
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Config
    let mut config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };
    if let Some(ip) = &args.destination_ip {
        config.destination_ip = ip.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if !args.resolvers.is_empty() {
        config.resolvers = args.resolvers.clone();
    }

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting hostsift...");

    // 3. Run
    let options = RunOptions {
        sources_path: args.sources,
        destination_path: args.destination,
        invalid_path: if args.check { args.invalid } else { None },
    };
    Pipeline::new(config).run(&options).await?;

    info!("done...");
    Ok(())
}
