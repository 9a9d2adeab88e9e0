//! One complete refresh: acquire, optionally validate, persist.

use crate::config::Config;
use crate::engine::{sorted_hosts, Downloader, HostChecker, InvalidHostSet, SourceFetcher};
use crate::persist;
use crate::resolver::{create_pool, HostLookup};
use crate::stats::{RunStats, StatsSnapshot};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub sources_path: PathBuf,
    pub destination_path: PathBuf,
    /// Set when hosts should be validated; the file doubles as the cache
    /// of hosts found dead on earlier runs.
    pub invalid_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub written: usize,
    pub new_invalid: usize,
    pub stats: StatsSnapshot,
}

pub struct Pipeline {
    config: Config,
    stats: Arc<RunStats>,
    lookup: Option<Arc<dyn HostLookup>>,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            stats: RunStats::new(),
            lookup: None,
        }
    }

    /// Replaces the resolver pool built from the config.
    pub fn with_lookup(mut self, lookup: Arc<dyn HostLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let sources = persist::load_sources(&options.sources_path)
            .await
            .context("Failed to load source list")?;

        let invalids = match &options.invalid_path {
            Some(path) => load_known_invalids(path)
                .await
                .context("Failed to load invalid hosts")?,
            None => InvalidHostSet::default(),
        };
        let invalids = Arc::new(invalids);

        let fetcher = SourceFetcher::new(&self.config)?;
        let downloader = Downloader::new(sources, invalids.clone(), fetcher, self.stats.clone());
        let mut hosts = sorted_hosts(downloader.run().await);

        let mut new_invalid = 0;
        if let Some(invalid_path) = &options.invalid_path {
            let lookup = match &self.lookup {
                Some(lookup) => lookup.clone(),
                None => Arc::new(create_pool(&self.config)?) as Arc<dyn HostLookup>,
            };

            let checker = HostChecker::new(
                hosts,
                self.config.workers,
                lookup,
                self.stats.clone(),
            );
            checker.start().await;
            hosts = checker.valids();

            let found = checker.invalids();
            new_invalid = found.len();
            if !found.is_empty() {
                let merged = persist::merge_invalid_hosts(&invalids, &found);
                persist::save_invalid_hosts(&merged, invalid_path)
                    .await
                    .context("Failed to save invalid hosts")?;
            }
        }

        persist::save_blocklist(&hosts, &self.config.destination_ip, &options.destination_path)
            .await
            .context("Failed to save blocklist")?;

        let written = hosts.iter().filter(|h| !h.is_empty()).count();
        info!("{} lines written.", written);

        Ok(RunSummary {
            written,
            new_invalid,
            stats: self.stats.snapshot(),
        })
    }
}

/// A missing cache only means nothing is known yet. Any other read error
/// is fatal, since the cache is rewritten from what was loaded.
async fn load_known_invalids(path: &std::path::Path) -> persist::Result<InvalidHostSet> {
    match persist::load_invalid_hosts(path).await {
        Ok(set) => {
            info!("Loaded {} known invalid hosts", set.len());
            Ok(set)
        }
        Err(e) if e.is_not_found() => {
            warn!("Starting with an empty invalid host set: {}", e);
            Ok(InvalidHostSet::default())
        }
        Err(e) => Err(e),
    }
}
