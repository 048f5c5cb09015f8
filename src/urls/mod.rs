//! URL normalization, validation and domain classification.
//!
//! The normalized URL produced here is the identity for every page-keyed
//! record: the frontier, the page store and the search index all key on it.

mod tests;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL parse error: {0}")]
    Parse(#[from] url::ParseError),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Canonicalize a URL string, optionally resolving it against a base.
///
/// Rules: http/https only; host lowercased; fragment stripped; query
/// parameters sorted lexicographically by key with values preserved; a
/// single trailing slash stripped unless the path is `/`.
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<String, UrlError> {
    let mut url = match base {
        Some(base) => base.join(raw)?,
        None => Url::parse(raw)?,
    };

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        // Stable sort keeps the relative order of repeated keys
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path[..path.len() - 1].to_string();
        url.set_path(&trimmed);
    }

    Ok(url.to_string())
}

/// Whether a URL falls inside a domain allowlist.
///
/// An empty allowlist admits everything. Otherwise the host must equal an
/// entry exactly or be a subdomain of one (`blog.example.com` matches
/// `example.com`; `notexample.com` does not).
pub fn should_crawl_domain(url: &str, allowlist: &[String]) -> bool {
    if allowlist.is_empty() {
        return true;
    }

    let host = match host_of(url) {
        Some(host) => host,
        None => return false,
    };

    allowlist.iter().any(|entry| {
        let entry = entry.trim().to_lowercase();
        host == entry || host.ends_with(&format!(".{}", entry))
    })
}

/// Lowercased host of a URL, if it has one
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}
