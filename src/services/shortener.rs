//! Shortening service
//!
//! Orchestrates validation, short-ID computation and persistence. Shortening
//! is idempotent per URL content: re-shortening recomputes the same token,
//! and a storage conflict is answered with the pre-existing token instead of
//! an error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::Result;
use crate::storage::{ShortenedEntry, Storage};
use crate::utils::{compute_short_id, validate_full_url};

/// Result of a single shorten call.
///
/// `existed` is set when the URL had already been shortened; the token is
/// valid either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenOutcome {
    pub short_id: String,
    pub existed: bool,
}

pub struct ShortenerService {
    storage: Arc<dyn Storage>,
}

impl ShortenerService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Shorten one URL for the given owner.
    pub async fn shorten(&self, user_id: i32, full_url: &str) -> Result<ShortenOutcome> {
        let full_url = validate_full_url(full_url)?;
        let short_id = compute_short_id(full_url);

        match self.storage.save(user_id, &short_id, full_url).await {
            Ok(()) => Ok(ShortenOutcome {
                short_id,
                existed: false,
            }),
            Err(e) if e.is_conflict() => {
                let existing = self.storage.lookup_short_id(full_url).await?;
                Ok(ShortenOutcome {
                    short_id: existing,
                    existed: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Shorten a batch of URLs in one storage call.
    ///
    /// Validation is all-or-nothing: one malformed URL fails the whole batch
    /// before anything is written. The output order matches the input order,
    /// including duplicates.
    pub async fn shorten_batch(&self, user_id: i32, full_urls: &[String]) -> Result<Vec<String>> {
        let mut short_ids = Vec::with_capacity(full_urls.len());
        let mut mapping = HashMap::with_capacity(full_urls.len());

        for full_url in full_urls {
            let full_url = validate_full_url(full_url)?;
            let short_id = compute_short_id(full_url);
            mapping.insert(short_id.clone(), full_url.to_string());
            short_ids.push(short_id);
        }

        self.storage.save_batch(user_id, &mapping).await?;

        Ok(short_ids)
    }

    /// Look up a short ID. A returned entry may be soft-deleted; the caller
    /// decides how to surface that.
    pub async fn resolve(&self, short_id: &str) -> Option<ShortenedEntry> {
        self.storage.resolve(short_id).await
    }
}
