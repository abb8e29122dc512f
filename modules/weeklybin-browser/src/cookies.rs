//! Netscape `cookies.txt` parser with mtime-based cache invalidation
//! (spec.md §4.3, §5: "read-mostly; invalidated on mtime change; writes
//! from the upload collaborator go directly to disk").

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use chromiumoxide::cdp::browser_protocol::network::CookieParam;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetscapeCookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    pub expires: i64,
    pub name: String,
    pub value: String,
}

/// Parse the Netscape cookies.txt format: tab-separated
/// `domain, include_subdomains, path, secure, expiration, name, value`;
/// `#`-prefixed lines are comments; lines with fewer than 7 fields are
/// skipped. A leading dot on the domain (wildcard subdomain marker) is
/// preserved verbatim.
#[must_use]
pub fn parse(contents: &str) -> Vec<NetscapeCookie> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(NetscapeCookie {
                domain: fields[0].to_string(),
                include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
                path: fields[2].to_string(),
                secure: fields[3].eq_ignore_ascii_case("TRUE"),
                expires: fields[4].parse().unwrap_or(0),
                name: fields[5].to_string(),
                value: fields[6].to_string(),
            })
        })
        .collect()
}

impl NetscapeCookie {
    #[must_use]
    pub fn to_cdp_param(&self) -> CookieParam {
        CookieParam::builder()
            .name(self.name.clone())
            .value(self.value.clone())
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .build()
            .expect("name and value are always set")
    }
}

struct Cached {
    mtime: SystemTime,
    cookies: Vec<NetscapeCookie>,
}

/// Caches the parsed cookie list, reloading only when the file's mtime
/// changes. Safe to share across concurrent captures — reads take a brief
/// lock, never hold it across I/O.
pub struct CookieStore {
    path: PathBuf,
    cached: Mutex<Option<Cached>>,
}

impl CookieStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Current cookie list, reloading from disk if the file doesn't exist
    /// yet or has a newer mtime than what's cached. Returns an empty list
    /// (not an error) if the file is absent — a missing cookie file just
    /// means anonymous captures.
    pub fn cookies(&self) -> Vec<NetscapeCookie> {
        let mtime = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(m) => m,
            Err(_) => return Vec::new(),
        };

        let mut guard = self.cached.lock().expect("cookie store lock poisoned");
        let needs_reload = match &*guard {
            Some(cached) => cached.mtime != mtime,
            None => true,
        };

        if needs_reload {
            let contents = std::fs::read_to_string(&self.path).unwrap_or_default();
            *guard = Some(Cached {
                mtime,
                cookies: parse(&contents),
            });
        }

        guard.as_ref().map(|c| c.cookies.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tab_separated_fields() {
        let input = "example.com\tTRUE\t/\tFALSE\t1999999999\tsession\tabc123";
        let cookies = parse(input);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].domain, "example.com");
        assert!(cookies[0].include_subdomains);
        assert!(!cookies[0].secure);
        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[0].value, "abc123");
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let input = "# Netscape HTTP Cookie File\n\nexample.com\tTRUE\t/\tFALSE\t0\tname\tvalue";
        let cookies = parse(input);
        assert_eq!(cookies.len(), 1);
    }

    #[test]
    fn skips_lines_with_fewer_than_seven_fields() {
        let input = "example.com\tTRUE\t/\tFALSE\t0\tname";
        assert!(parse(input).is_empty());
    }

    #[test]
    fn preserves_leading_dot_on_domain() {
        let input = ".example.com\tTRUE\t/\tTRUE\t0\tname\tvalue";
        let cookies = parse(input);
        assert_eq!(cookies[0].domain, ".example.com");
    }

    #[test]
    fn cache_reloads_when_file_is_touched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "example.com\tTRUE\t/\tFALSE\t0\tname\tone").unwrap();

        let store = CookieStore::new(&path);
        let first = store.cookies();
        assert_eq!(first[0].value, "one");

        // Ensure a distinct mtime on filesystems with coarse timestamp granularity.
        std::thread::sleep(std::time::Duration::from_millis(10));
        std::fs::write(&path, "example.com\tTRUE\t/\tFALSE\t0\tname\ttwo").unwrap();
        let second = store.cookies();
        assert_eq!(second[0].value, "two");
    }

    #[test]
    fn missing_file_returns_empty_without_error() {
        let store = CookieStore::new("/nonexistent/path/cookies.txt");
        assert!(store.cookies().is_empty());
    }
}
