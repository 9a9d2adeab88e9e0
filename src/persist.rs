//! Line-oriented files: source lists, the invalid-host cache and the
//! generated blocklist.

use crate::engine::{HostSet, InvalidHostSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::info;

#[derive(Debug, Error)]
#[error("{action} {}: {source}", .path.display())]
pub struct PersistError {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

impl PersistError {
    fn new(action: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_not_found(&self) -> bool {
        self.source.kind() == std::io::ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// Lines are decoded one at a time, so a stray non-UTF-8 byte only
/// mangles its own line.
async fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)
        .await
        .map_err(|e| PersistError::new("cannot open", path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| PersistError::new("cannot read", path, e))?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        out.push(line.trim_end_matches(['\n', '\r']).to_string());
    }
    Ok(out)
}

/// One locator per line; blanks and `#` comments are skipped.
pub async fn load_sources(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let lines = read_lines(path.as_ref()).await?;
    Ok(lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// One host per line, no comments.
pub async fn load_invalid_hosts(path: impl AsRef<Path>) -> Result<InvalidHostSet> {
    let lines = read_lines(path.as_ref()).await?;
    Ok(lines.into_iter().filter(|line| !line.is_empty()).collect())
}

/// Union of the previous cache and this run's findings, sorted.
pub fn merge_invalid_hosts(previous: &InvalidHostSet, found: &[String]) -> Vec<String> {
    let mut merged: HostSet = previous.clone();
    merged.extend(found.iter().cloned());
    crate::engine::sorted_hosts(merged)
}

/// `address=/<host>/<ip>` per host, sorted, blanks dropped.
pub fn render_blocklist(hosts: &[String], destination_ip: &str) -> String {
    let mut sorted: Vec<&String> = hosts.iter().filter(|h| !h.is_empty()).collect();
    sorted.sort();

    let mut out = String::new();
    for host in sorted {
        out.push_str("address=/");
        out.push_str(host);
        out.push('/');
        out.push_str(destination_ip);
        out.push('\n');
    }
    out
}

pub async fn save_blocklist(
    hosts: &[String],
    destination_ip: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    info!("Saving hosts file");
    write_replacing(path.as_ref(), render_blocklist(hosts, destination_ip).as_bytes()).await
}

pub async fn save_invalid_hosts(hosts: &[String], path: impl AsRef<Path>) -> Result<()> {
    info!("Saving invalid hosts file");
    let mut sorted: Vec<&String> = hosts.iter().collect();
    sorted.sort();

    let mut out = String::new();
    for host in sorted {
        out.push_str(host);
        out.push('\n');
    }
    write_replacing(path.as_ref(), out.as_bytes()).await
}

/// Writes next to the target, then renames over it.
async fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_sibling(path);

    let written = async {
        let file = fs::File::create(&tmp).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(contents).await?;
        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp).await;
        return Err(PersistError::new("cannot write", path, e));
    }

    fs::rename(&tmp, path)
        .await
        .map_err(|e| PersistError::new("cannot replace", path, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("hostsift"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HostSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_blocklist_format() {
        let hosts = vec!["b.com".to_string(), "a.com".to_string()];
        assert_eq!(
            render_blocklist(&hosts, "0.0.0.0"),
            "address=/a.com/0.0.0.0\naddress=/b.com/0.0.0.0\n"
        );
    }

    #[test]
    fn test_render_blocklist_skips_blank_hosts() {
        let hosts = vec!["".to_string(), "x.org".to_string()];
        assert_eq!(render_blocklist(&hosts, "127.0.0.1"), "address=/x.org/127.0.0.1\n");
        assert_eq!(render_blocklist(&[], "0.0.0.0"), "");
    }

    #[test]
    fn test_merge_is_union_and_sorted() {
        let previous = set(&["c.com", "a.com"]);
        let merged = merge_invalid_hosts(&previous, &["b.com".to_string(), "a.com".to_string()]);
        assert_eq!(merged, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn test_merge_with_known_hosts_changes_nothing() {
        let previous = set(&["a.com", "b.com"]);
        let merged = merge_invalid_hosts(&previous, &["b.com".to_string()]);
        assert_eq!(merged, vec!["a.com", "b.com"]);
        assert_eq!(merge_invalid_hosts(&previous, &[]), merged);
    }

    #[test]
    fn test_temp_sibling_stays_in_directory() {
        assert_eq!(
            temp_sibling(Path::new("/etc/dnsmasq.d/block.conf")),
            PathBuf::from("/etc/dnsmasq.d/block.conf.tmp")
        );
    }

    #[tokio::test]
    async fn test_save_and_reload_invalids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.txt");

        save_invalid_hosts(&["z.com".to_string(), "m.com".to_string()], &path)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "m.com\nz.com\n");

        let loaded = load_invalid_hosts(&path).await.unwrap();
        assert_eq!(loaded, set(&["m.com", "z.com"]));
        assert!(!dir.path().join("invalid.txt.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_sources_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.txt");
        std::fs::write(
            &path,
            "# upstream feeds\n\nhttps://example.com/hosts\n  https://example.org/list  \n   # off\n",
        )
        .unwrap();

        let sources = load_sources(&path).await.unwrap();
        assert_eq!(
            sources,
            vec!["https://example.com/hosts", "https://example.org/list"]
        );
    }

    #[tokio::test]
    async fn test_failed_write_leaves_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let missing_dir = dir.path().join("missing").join("out.conf");

        let err = save_blocklist(&["a.com".to_string()], "0.0.0.0", &missing_dir)
            .await
            .unwrap_err();
        assert_eq!(err.path(), missing_dir.as_path());
        assert!(!missing_dir.exists());
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let err = load_invalid_hosts("/no/such/invalid.txt").await.unwrap_err();
        assert!(err.to_string().starts_with("cannot open /no/such/invalid.txt"));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_non_utf8_line_keeps_its_neighbours() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid.txt");
        std::fs::write(&path, b"old1.example.com\r\ncaf\xe9.example\nold2.example.com").unwrap();

        let loaded = load_invalid_hosts(&path).await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.contains("old1.example.com"));
        assert!(loaded.contains("old2.example.com"));
        assert!(loaded.contains("caf\u{FFFD}.example"));
    }

    #[tokio::test]
    async fn test_directory_is_not_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_invalid_hosts(dir.path()).await.unwrap_err();
        assert!(!err.is_not_found());
    }
}
