//! Month-scoped file cache.
//!
//! A document cached under `key` lives in `{dir}/{key}-{YYYY-MM}.json` and is
//! only read back during the calendar month it was written in. Files from
//! earlier months are pruned when the current month's copy is written.

use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::error::{InspectorError, InspectorResult};

#[derive(Debug, Clone)]
pub struct MonthlyFileCache {
    dir: PathBuf,
}

impl MonthlyFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `key` for the month containing `now`.
    pub fn path_for(&self, key: &str, now: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(format!("{}-{}.json", sanitise_key(key), now.format("%Y-%m")))
    }

    /// This month's copy of `key`, if one was written.
    pub fn read(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let path = self.path_for(key, now);
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!("[Cache] Hit {}", path.display());
                Some(contents)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("[Cache] Cannot read {}: {e}", path.display());
                None
            }
        }
    }

    /// Store this month's copy of `key` unless another writer got there
    /// first. The file appears atomically with its full contents.
    pub fn write(&self, key: &str, now: DateTime<Utc>, contents: &str) -> InspectorResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| cache_error(&self.dir, &e))?;

        let path = self.path_for(key, now);
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(|e| cache_error(&self.dir, &e))?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| cache_error(temp.path(), &e))?;

        match temp.persist_noclobber(&path) {
            Ok(_) => debug!("[Cache] Stored {}", path.display()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                debug!("[Cache] {} already written by another run", path.display());
            }
            Err(e) => return Err(cache_error(&path, &e.error)),
        }

        self.prune(key, now);
        Ok(())
    }

    /// Remove copies of `key` from months other than the one containing `now`.
    pub fn prune(&self, key: &str, now: DateTime<Utc>) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        let prefix = format!("{}-", sanitise_key(key));
        let current = self.path_for(key, now);

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_stale_copy = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .is_some_and(is_month_stamp);
            if is_stale_copy && path != current {
                match std::fs::remove_file(&path) {
                    Ok(()) => debug!("[Cache] Pruned {}", path.display()),
                    Err(e) => warn!("[Cache] Cannot prune {}: {e}", path.display()),
                }
            }
        }
    }

    /// Delete this month's copy of `key`, if any.
    pub fn remove(&self, key: &str, now: DateTime<Utc>) {
        let path = self.path_for(key, now);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!("[Cache] Removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("[Cache] Cannot remove {}: {e}", path.display()),
        }
    }

    /// This month's copy of `key`, fetching and storing it on a miss.
    ///
    /// A failed write is logged and the fetched document is still returned.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        fetch: F,
    ) -> InspectorResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = InspectorResult<String>>,
    {
        self.get_or_fetch_with(key, now, |contents| Ok(contents.to_string()), fetch)
            .await
    }

    /// Like [`MonthlyFileCache::get_or_fetch`], but every document goes
    /// through `parse` first.
    ///
    /// A fetched document is stored only once it parses. A cached copy that
    /// no longer parses is deleted and fetched again.
    pub async fn get_or_fetch_with<T, P, F, Fut>(
        &self,
        key: &str,
        now: DateTime<Utc>,
        parse: P,
        fetch: F,
    ) -> InspectorResult<T>
    where
        P: Fn(&str) -> InspectorResult<T>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = InspectorResult<String>>,
    {
        if let Some(cached) = self.read(key, now) {
            match parse(&cached) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("[Cache] Discarding unreadable copy of '{key}': {e}");
                    self.remove(key, now);
                }
            }
        }

        let contents = fetch().await?;
        let value = parse(&contents)?;
        if let Err(e) = self.write(key, now, &contents) {
            warn!("[Cache] {e}");
        }
        Ok(value)
    }
}

/// Keys become file names, so anything outside `[A-Za-z0-9._-]` is replaced.
fn sanitise_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `YYYY-MM`
fn is_month_stamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || b.is_ascii_digit())
}

fn cache_error(path: &Path, e: &std::io::Error) -> InspectorError {
    InspectorError::CacheError(format!("{}: {e}", path.display()))
}
