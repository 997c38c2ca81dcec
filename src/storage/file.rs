//! Append-only file storage backend
//!
//! The on-disk layout is a sequence of independently decodable JSON records,
//! one per line, each holding `(short_id, full_url)`. Records are only ever
//! appended; the whole log is replayed into a concurrent index at startup.
//! This backend is a single-tenant shim: it tracks no ownership, so listing
//! and deletion report `NotSupported`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{Result, ShortenerError};
use crate::storage::{DeleteRequest, ShortenedEntry, Storage};

/// Owner reported for every entry; the file backend predates identities.
const PLACEHOLDER_USER_ID: i32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    short_id: String,
    full_url: String,
}

pub struct FileStorage {
    /// short_id -> full_url
    index: DashMap<String, String>,
    /// full_url -> short_id; guards content uniqueness
    reverse: DashMap<String, String>,
    writer: Mutex<BufWriter<File>>,
}

impl FileStorage {
    pub fn new(path: &str) -> Result<Self> {
        let index = DashMap::new();
        let reverse = DashMap::new();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)
            .map_err(|e| {
                ShortenerError::file_operation(format!("cannot open storage file {path}: {e}"))
            })?;

        for line in BufReader::new(&file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: FileRecord = serde_json::from_str(&line).map_err(|e| {
                ShortenerError::serialization(format!("malformed record in {path}: {e}"))
            })?;
            reverse.insert(record.full_url.clone(), record.short_id.clone());
            index.insert(record.short_id, record.full_url);
        }

        info!("file storage loaded {} records from {}", index.len(), path);

        let append = OpenOptions::new().append(true).open(path).map_err(|e| {
            ShortenerError::file_operation(format!("cannot open storage file {path}: {e}"))
        })?;

        Ok(FileStorage {
            index,
            reverse,
            writer: Mutex::new(BufWriter::new(append)),
        })
    }

    fn append_records(&self, records: &[FileRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut writer = self.writer.lock();
        for record in records {
            let line = serde_json::to_string(record)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Claim the URL in the in-memory maps; `false` means it was taken.
    fn claim(&self, short_id: &str, full_url: &str) -> bool {
        match self.reverse.entry(full_url.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(short_id.to_string());
                self.index.insert(short_id.to_string(), full_url.to_string());
                true
            }
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn resolve(&self, short_id: &str) -> Option<ShortenedEntry> {
        self.index.get(short_id).map(|full_url| ShortenedEntry {
            short_id: short_id.to_string(),
            full_url: full_url.clone(),
            user_id: PLACEHOLDER_USER_ID,
            is_deleted: false,
        })
    }

    async fn save(&self, _user_id: i32, short_id: &str, full_url: &str) -> Result<()> {
        if !self.claim(short_id, full_url) {
            return Err(ShortenerError::conflict(format!(
                "URL is already shortened: {full_url}"
            )));
        }

        self.append_records(&[FileRecord {
            short_id: short_id.to_string(),
            full_url: full_url.to_string(),
        }])
    }

    async fn save_batch(&self, _user_id: i32, entries: &HashMap<String, String>) -> Result<()> {
        let new_records: Vec<FileRecord> = entries
            .iter()
            .filter(|(short_id, full_url)| self.claim(short_id, full_url))
            .map(|(short_id, full_url)| FileRecord {
                short_id: short_id.clone(),
                full_url: full_url.clone(),
            })
            .collect();

        self.append_records(&new_records)
    }

    async fn lookup_short_id(&self, full_url: &str) -> Result<String> {
        self.reverse
            .get(full_url)
            .map(|short_id| short_id.clone())
            .ok_or_else(|| ShortenerError::not_found(format!("URL is not shortened: {full_url}")))
    }

    async fn list_by_owner(&self, _user_id: i32) -> Result<HashMap<String, String>> {
        Err(ShortenerError::not_supported(
            "listing by owner is not supported by the file backend",
        ))
    }

    async fn allocate_user_id(&self) -> Result<i32> {
        Ok(PLACEHOLDER_USER_ID)
    }

    async fn mark_deleted(&self, _requests: &[DeleteRequest]) -> Result<()> {
        Err(ShortenerError::not_supported(
            "deletion is not supported by the file backend",
        ))
    }

    async fn check_liveness(&self) -> Result<()> {
        Err(ShortenerError::not_supported(
            "liveness check is not supported by the file backend",
        ))
    }

    async fn shutdown(&self) {
        if let Err(e) = self.writer.lock().flush() {
            tracing::error!("failed to flush storage file on shutdown: {}", e);
        }
    }
}
