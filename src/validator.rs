//! Best-effort guard against cloning internal hosts.
//!
//! This is a hostname blacklist, not a guarantee: DNS names that resolve to
//! private addresses still pass.

use url::Url;

const BLOCKED_PREFIXES: &[&str] = &[
    "10.",
    "172.16.", "172.17.", "172.18.", "172.19.", "172.20.", "172.21.", "172.22.", "172.23.",
    "172.24.", "172.25.", "172.26.", "172.27.", "172.28.", "172.29.", "172.30.", "172.31.",
    "192.168.",
    "127.",
    "169.254.",
];

/// Returns `true` when `url` is an http(s) URL pointing at a public-looking host.
pub fn validate(url: &str) -> bool {
    let parsed = match Url::parse(url.trim()) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    let host = match parsed.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return false,
    };

    if host == "localhost" {
        return false;
    }

    !BLOCKED_PREFIXES.iter().any(|prefix| host.starts_with(prefix))
}
