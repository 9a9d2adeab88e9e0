use crate::resolver::{HostLookup, Verdict};
use crate::stats::RunStats;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tracing::{debug, error, info};

const WORK_QUEUE_CAPACITY: usize = 1024;

/// Splits a host list into resolvable and dead names using a fixed pool of
/// worker tasks.
pub struct HostChecker {
    hosts: Vec<String>,
    max_workers: usize,
    lookup: Arc<dyn HostLookup>,
    stats: Arc<RunStats>,
    valid: Arc<Mutex<Vec<String>>>,
    invalid: Arc<Mutex<Vec<String>>>,
}

impl HostChecker {
    pub fn new(
        hosts: Vec<String>,
        max_workers: usize,
        lookup: Arc<dyn HostLookup>,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            hosts,
            max_workers,
            lookup,
            stats,
            valid: Arc::new(Mutex::new(Vec::new())),
            invalid: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Runs the check to completion. Results are only complete once this
    /// returns.
    pub async fn start(&self) {
        let workers = self.max_workers.max(1).min(self.hosts.len());
        info!(
            "Checking {} hosts with {} workers...",
            self.hosts.len(),
            workers
        );

        let (work_tx, work_rx) = mpsc::channel::<String>(WORK_QUEUE_CAPACITY);
        let work_rx = Arc::new(AsyncMutex::new(work_rx));

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let work_rx = work_rx.clone();
                let lookup = self.lookup.clone();
                let stats = self.stats.clone();
                let valid = self.valid.clone();
                let invalid = self.invalid.clone();
                tokio::spawn(async move {
                    loop {
                        let next = work_rx.lock().await.recv().await;
                        let Some(host) = next else {
                            // Queue closed and drained
                            break;
                        };
                        match Self::check(lookup.as_ref(), &host, &stats).await {
                            Verdict::Valid => valid.lock().push(host),
                            Verdict::Invalid => invalid.lock().push(host),
                        }
                    }
                })
            })
            .collect();

        for host in &self.hosts {
            if work_tx.send(host.clone()).await.is_err() {
                error!("All host check workers exited early");
                break;
            }
        }
        drop(work_tx);

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Host check worker aborted: {}", e);
            }
        }

        self.stats.log_validation();
    }

    async fn check(lookup: &dyn HostLookup, host: &str, stats: &RunStats) -> Verdict {
        let name = host.trim();
        let result = lookup.lookup_host(name).await;
        let verdict = Verdict::of(&result);

        if let Err(failure) = &result {
            stats.record_lookup_failure(failure);
            match verdict {
                Verdict::Invalid => debug!(host = name, %failure, "removing"),
                Verdict::Valid => debug!(host = name, %failure, "keeping despite error"),
            }
        }
        match verdict {
            Verdict::Valid => stats.inc_valid(),
            Verdict::Invalid => stats.inc_invalid(),
        }
        verdict
    }

    pub fn valids(&self) -> Vec<String> {
        self.valid.lock().clone()
    }

    pub fn invalids(&self) -> Vec<String> {
        self.invalid.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{LookupFailure, LookupResult};
    use rustc_hash::FxHashSet;
    use std::time::Duration;

    /// Answers by naming convention: the first label picks the outcome.
    struct ScriptedLookup;

    #[async_trait::async_trait]
    impl HostLookup for ScriptedLookup {
        async fn lookup_host(&self, host: &str) -> LookupResult {
            tokio::time::sleep(Duration::from_millis(1)).await;
            match host.split('.').next().unwrap_or_default() {
                "timeout" => Err(LookupFailure::Timeout),
                "nx" => Err(LookupFailure::NotFound),
                "servfail" => Err(LookupFailure::Temporary("SERVFAIL".into())),
                "odd" => Err(LookupFailure::Other("odd".into())),
                _ => Ok(vec!["192.0.2.1".parse().unwrap()]),
            }
        }
    }

    fn checker(hosts: Vec<String>, workers: usize) -> HostChecker {
        HostChecker::new(hosts, workers, Arc::new(ScriptedLookup), RunStats::new())
    }

    #[tokio::test]
    async fn test_classification_policy() {
        let hosts: Vec<String> = [
            "ok.example.com",
            "timeout.example.com",
            "nx.example.com",
            "servfail.example.com",
            "odd.example.com",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let hc = checker(hosts, 3);
        hc.start().await;

        let mut valid = hc.valids();
        valid.sort();
        let mut invalid = hc.invalids();
        invalid.sort();
        assert_eq!(
            valid,
            vec!["odd.example.com", "ok.example.com", "servfail.example.com"]
        );
        assert_eq!(invalid, vec!["nx.example.com", "timeout.example.com"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_partition_is_exact() {
        // More hosts than the work queue holds, so the feeder has to wait
        let hosts: Vec<String> = (0..3000)
            .map(|i| match i % 3 {
                0 => format!("nx.host{}.example.com", i),
                1 => format!("ok.host{}.example.com", i),
                _ => format!("servfail.host{}.example.com", i),
            })
            .collect();

        let hc = checker(hosts.clone(), 64);
        hc.start().await;

        let valid: FxHashSet<String> = hc.valids().into_iter().collect();
        let invalid: FxHashSet<String> = hc.invalids().into_iter().collect();
        let input: FxHashSet<String> = hosts.into_iter().collect();

        assert_eq!(valid.len() + invalid.len(), input.len());
        assert!(valid.is_disjoint(&invalid));
        let union: FxHashSet<String> = valid.union(&invalid).cloned().collect();
        assert_eq!(union, input);
        assert_eq!(invalid.len(), 1000);
    }

    #[tokio::test]
    async fn test_original_spelling_is_kept() {
        let hc = checker(vec![" nx.example.com ".to_string()], 1);
        hc.start().await;
        assert_eq!(hc.invalids(), vec![" nx.example.com ".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_input_and_zero_workers() {
        let hc = checker(vec![], 0);
        hc.start().await;
        assert!(hc.valids().is_empty());
        assert!(hc.invalids().is_empty());

        let hc = checker(vec!["ok.example.com".to_string()], 0);
        hc.start().await;
        assert_eq!(hc.valids(), vec!["ok.example.com".to_string()]);
    }
}
