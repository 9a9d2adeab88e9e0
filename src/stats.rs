use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::resolver::LookupFailure;

/// Counters shared by both phases of a run.
///
/// Every field is a plain atomic so tasks can bump them without taking any
/// of the locks that guard the host collections.
#[derive(Debug, Default)]
pub struct RunStats {
    // Acquisition
    sources_ok: AtomicU64,
    sources_failed: AtomicU64,
    raw_entries: AtomicU64,
    distinct_hosts: AtomicU64,

    // Validation
    valid: AtomicU64,
    invalid: AtomicU64,
    lookup_timeouts: AtomicU64,
    lookup_not_found: AtomicU64,
    lookup_temporary: AtomicU64,
    lookup_other: AtomicU64,
}

/// Point-in-time copy of [`RunStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub sources_ok: u64,
    pub sources_failed: u64,
    pub raw_entries: u64,
    pub distinct_hosts: u64,
    pub valid: u64,
    pub invalid: u64,
    pub lookup_timeouts: u64,
    pub lookup_not_found: u64,
    pub lookup_temporary: u64,
    pub lookup_other: u64,
}

impl RunStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_source(&self, accepted: usize) {
        self.sources_ok.fetch_add(1, Ordering::Relaxed);
        self.raw_entries
            .fetch_add(accepted as u64, Ordering::Relaxed);
    }

    pub fn record_source_failure(&self) {
        self.sources_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_distinct_hosts(&self, count: usize) {
        self.distinct_hosts.store(count as u64, Ordering::Relaxed);
    }

    pub fn inc_valid(&self) {
        self.valid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid(&self) {
        self.invalid.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup_failure(&self, failure: &LookupFailure) {
        let counter = match failure {
            LookupFailure::Timeout => &self.lookup_timeouts,
            LookupFailure::NotFound => &self.lookup_not_found,
            LookupFailure::Temporary(_) => &self.lookup_temporary,
            LookupFailure::Other(_) => &self.lookup_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            sources_ok: self.sources_ok.load(Ordering::Relaxed),
            sources_failed: self.sources_failed.load(Ordering::Relaxed),
            raw_entries: self.raw_entries.load(Ordering::Relaxed),
            distinct_hosts: self.distinct_hosts.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            lookup_timeouts: self.lookup_timeouts.load(Ordering::Relaxed),
            lookup_not_found: self.lookup_not_found.load(Ordering::Relaxed),
            lookup_temporary: self.lookup_temporary.load(Ordering::Relaxed),
            lookup_other: self.lookup_other.load(Ordering::Relaxed),
        }
    }

    pub fn log_acquisition(&self) {
        let s = self.snapshot();
        info!(
            "ACQUISITION: Sources: {} ok / {} failed, Entries: {}, Distinct: {} ({:.1}% duplicates)",
            s.sources_ok,
            s.sources_failed,
            s.raw_entries,
            s.distinct_hosts,
            if s.raw_entries > 0 {
                (1.0 - s.distinct_hosts as f64 / s.raw_entries as f64) * 100.0
            } else {
                0.0
            }
        );
    }

    pub fn log_validation(&self) {
        let s = self.snapshot();
        let checked = s.valid + s.invalid;
        info!(
            "VALIDATION: Checked: {}, Valid: {}, Invalid: {} ({:.1}%), Failures: [timeout: {}] [not found: {}] [temporary: {}] [other: {}]",
            checked,
            s.valid,
            s.invalid,
            if checked > 0 {
                (s.invalid as f64 / checked as f64) * 100.0
            } else {
                0.0
            },
            s.lookup_timeouts,
            s.lookup_not_found,
            s.lookup_temporary,
            s.lookup_other
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = RunStats::new();
        stats.record_source(10);
        stats.record_source(5);
        stats.record_source_failure();
        stats.set_distinct_hosts(12);
        stats.inc_valid();
        stats.inc_invalid();
        stats.record_lookup_failure(&LookupFailure::Timeout);
        stats.record_lookup_failure(&LookupFailure::Temporary("servfail".into()));

        let s = stats.snapshot();
        assert_eq!(s.sources_ok, 2);
        assert_eq!(s.sources_failed, 1);
        assert_eq!(s.raw_entries, 15);
        assert_eq!(s.distinct_hosts, 12);
        assert_eq!(s.valid, 1);
        assert_eq!(s.invalid, 1);
        assert_eq!(s.lookup_timeouts, 1);
        assert_eq!(s.lookup_temporary, 1);
        assert_eq!(s.lookup_not_found, 0);
    }
}
