mod checker;
mod downloader;
pub mod parser;
pub mod source;

pub use checker::HostChecker;
pub use downloader::Downloader;
pub use source::{FetchError, Source, SourceFetcher};

use rustc_hash::FxHashSet;

/// Unique hostnames, compared exactly as written.
pub type HostSet = FxHashSet<String>;

/// Hosts found dead on an earlier run.
pub type InvalidHostSet = HostSet;

/// Set contents in lexicographic order.
pub fn sorted_hosts(hosts: HostSet) -> Vec<String> {
    let mut list: Vec<String> = hosts.into_iter().collect();
    list.sort();
    list
}
