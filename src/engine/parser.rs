use super::HostSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Extracts the host candidate from one list line.
///
/// Handles:
/// - `0.0.0.0 ads.example.com` (hosts format, second field wins)
/// - `ads.example.com` (bare host)
/// - blank lines and `#` comments (skipped)
/// - anything carrying adblock markers `|` or `^` (rejected)
pub fn parse_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split_whitespace();
    let first = fields.next()?;
    let host = fields.next().unwrap_or(first);

    if host.is_empty() || host.contains(|c| c == '|' || c == '^') {
        return None;
    }
    Some(host)
}

/// Reads a whole list, keeping every accepted host not already known invalid.
///
/// Lines are decoded lossily so a stray non-UTF-8 byte costs one line, not
/// the whole source.
pub async fn parse_stream<R>(mut reader: R, invalids: &HostSet) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut result = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(host) = parse_line(&line) {
            if !invalids.contains(host) {
                result.push(host.to_string());
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
fn parse_content(text: &str, invalids: &HostSet) -> Vec<String> {
    text.lines()
        .filter_map(parse_line)
        .filter(|host| !invalids.contains(*host))
        .map(str::to_string)
        .collect()
}
