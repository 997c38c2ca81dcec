//! URL validation
//!
//! Every URL is validated before any storage call; the ID generator itself
//! never validates.

use url::Url;

use crate::errors::{Result, ShortenerError};

/// Validate that `full_url` is an absolute http(s) URL.
///
/// Returns the trimmed URL string that should be stored.
pub fn validate_full_url(full_url: &str) -> Result<&str> {
    let full_url = full_url.trim();

    if full_url.is_empty() {
        return Err(ShortenerError::validation("URL cannot be empty"));
    }

    let parsed = Url::parse(full_url)
        .map_err(|e| ShortenerError::validation(format!("invalid URL {full_url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ShortenerError::validation(format!(
                "invalid URL scheme {other}: only http and https are allowed"
            )));
        }
    }

    if !parsed.has_host() {
        return Err(ShortenerError::validation(format!(
            "URL has no host: {full_url}"
        )));
    }

    Ok(full_url)
}
