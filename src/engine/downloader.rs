use super::parser::parse_stream;
use super::source::{FetchError, Source, SourceFetcher};
use super::HostSet;
use crate::stats::RunStats;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Fetches every source at once and folds the results into one host set.
pub struct Downloader {
    sources: Vec<String>,
    invalids: Arc<HostSet>,
    fetcher: SourceFetcher,
    stats: Arc<RunStats>,
}

impl Downloader {
    pub fn new(
        sources: Vec<String>,
        invalids: Arc<HostSet>,
        fetcher: SourceFetcher,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            sources,
            invalids,
            fetcher,
            stats,
        }
    }

    /// Returns once every source task has finished, successfully or not.
    pub async fn run(&self) -> HostSet {
        info!("Downloading {} sources...", self.sources.len());

        // Sized so no task ever waits on the collector
        let (tx, mut rx) = mpsc::channel::<Vec<String>>(self.sources.len().max(1));

        let handles: Vec<_> = self
            .sources
            .iter()
            .cloned()
            .map(|locator| {
                let tx = tx.clone();
                let fetcher = self.fetcher.clone();
                let invalids = self.invalids.clone();
                let stats = self.stats.clone();
                tokio::spawn(async move {
                    let hosts = Self::fetch_and_parse(&fetcher, &locator, &invalids, &stats).await;
                    if tx.send(hosts).await.is_err() {
                        warn!("Result channel closed; dropping hosts from {}", locator);
                    }
                })
            })
            .collect();
        drop(tx);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Source task aborted: {}", e);
            }
        }

        info!("Postprocessing...");
        let mut hosts = HostSet::default();
        while let Ok(list) = rx.try_recv() {
            hosts.extend(list);
        }

        self.stats.set_distinct_hosts(hosts.len());
        self.stats.log_acquisition();
        hosts
    }

    /// One source in, accepted hosts out. Failures are logged and yield
    /// nothing.
    async fn fetch_and_parse(
        fetcher: &SourceFetcher,
        locator: &str,
        invalids: &HostSet,
        stats: &RunStats,
    ) -> Vec<String> {
        info!("Downloading {}", locator);

        match Self::try_fetch(fetcher, locator, invalids).await {
            Ok(hosts) => {
                info!("Parsed {} entries from {}", hosts.len(), locator);
                stats.record_source(hosts.len());
                hosts
            }
            Err(e) => {
                warn!("Error downloading {}: {}", locator, e);
                stats.record_source_failure();
                vec![]
            }
        }
    }

    async fn try_fetch(
        fetcher: &SourceFetcher,
        locator: &str,
        invalids: &HostSet,
    ) -> Result<Vec<String>, FetchError> {
        let source = Source::parse(locator)?;
        debug!("Opening {}", source);
        let reader = fetcher.open(&source).await?;
        Ok(parse_stream(reader, invalids).await?)
    }
}
