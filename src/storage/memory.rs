//! In-memory storage backend
//!
//! Holds the canonical mapping in concurrent maps: a forward map from short
//! ID to entry state and a reverse map from full URL to short ID. The
//! reverse map's entry API is the atomic primitive that decides `save`
//! races: exactly one creator wins, the rest observe a conflict.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::errors::{Result, ShortenerError};
use crate::storage::{DeleteRequest, ShortenedEntry, Storage};

#[derive(Debug)]
struct EntryState {
    full_url: String,
    user_id: i32,
    is_deleted: bool,
}

pub struct MemoryStorage {
    /// short_id -> entry state
    entries: DashMap<String, EntryState>,
    /// full_url -> short_id; guards content uniqueness
    index: DashMap<String, String>,
    next_user_id: AtomicI32,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            entries: DashMap::new(),
            index: DashMap::new(),
            next_user_id: AtomicI32::new(1),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn resolve(&self, short_id: &str) -> Option<ShortenedEntry> {
        self.entries.get(short_id).map(|state| ShortenedEntry {
            short_id: short_id.to_string(),
            full_url: state.full_url.clone(),
            user_id: state.user_id,
            is_deleted: state.is_deleted,
        })
    }

    async fn save(&self, user_id: i32, short_id: &str, full_url: &str) -> Result<()> {
        match self.index.entry(full_url.to_string()) {
            Entry::Occupied(_) => Err(ShortenerError::conflict(format!(
                "URL is already shortened: {full_url}"
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(short_id.to_string());
                self.entries.insert(
                    short_id.to_string(),
                    EntryState {
                        full_url: full_url.to_string(),
                        user_id,
                        is_deleted: false,
                    },
                );
                Ok(())
            }
        }
    }

    async fn save_batch(&self, user_id: i32, entries: &HashMap<String, String>) -> Result<()> {
        for (short_id, full_url) in entries {
            match self.save(user_id, short_id, full_url).await {
                Ok(()) => {}
                Err(e) if e.is_conflict() => {} // already present, skip
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn lookup_short_id(&self, full_url: &str) -> Result<String> {
        self.index
            .get(full_url)
            .map(|short_id| short_id.clone())
            .ok_or_else(|| ShortenerError::not_found(format!("URL is not shortened: {full_url}")))
    }

    async fn list_by_owner(&self, user_id: i32) -> Result<HashMap<String, String>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| (entry.key().clone(), entry.value().full_url.clone()))
            .collect())
    }

    async fn allocate_user_id(&self) -> Result<i32> {
        Ok(self.next_user_id.fetch_add(1, Ordering::Relaxed))
    }

    async fn mark_deleted(&self, requests: &[DeleteRequest]) -> Result<()> {
        for request in requests {
            if let Some(mut state) = self.entries.get_mut(&request.short_id) {
                // Owner mismatches are silently ignored by contract.
                if state.user_id == request.user_id {
                    state.is_deleted = true;
                }
            }
        }
        Ok(())
    }

    async fn check_liveness(&self) -> Result<()> {
        Err(ShortenerError::not_supported(
            "liveness check is not supported by the memory backend",
        ))
    }

    async fn shutdown(&self) {
        debug!("memory storage shut down, {} entries dropped", self.entries.len());
    }
}
