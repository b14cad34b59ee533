//! Durable snapshot storage for acquired series.
//!
//! One snapshot per [`SeriesKey`], overwritten wholesale on every save.
//! Staleness is judged from the write time of the snapshot, never from the
//! dates inside the series.

use std::collections::HashMap;
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;

use crate::error::CacheError;
use crate::{CanonicalSeries, SeriesKey, UtcDateTime};

/// How an acquisition cycle uses the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Serve a fresh, valid snapshot if there is one; store the accepted candidate. (Default)
    #[default]
    Use,
    /// Skip the snapshot read but store the accepted candidate.
    Refresh,
    /// Neither read nor write the store.
    Bypass,
}

impl CacheMode {
    pub const fn reads(self) -> bool {
        matches!(self, Self::Use)
    }

    pub const fn writes(self) -> bool {
        !matches!(self, Self::Bypass)
    }
}

/// A persisted series and the wall-clock time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub written_at: UtcDateTime,
    pub series: CanonicalSeries,
}

/// `true` when more than `ttl` has passed between the write and `now`.
pub fn is_stale(snapshot: &CacheSnapshot, ttl: Duration, now: UtcDateTime) -> bool {
    now.elapsed_since(snapshot.written_at) > ttl
}

pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + Send + 'a>>;

/// Key to snapshot store.
///
/// Implementations must make a save atomic with respect to concurrent loads:
/// a reader sees either the previous snapshot or the new one.
pub trait CacheStore: Send + Sync {
    fn load<'a>(&'a self, key: &'a SeriesKey) -> CacheFuture<'a, Option<CacheSnapshot>>;

    fn save_at<'a>(
        &'a self,
        key: &'a SeriesKey,
        series: &'a CanonicalSeries,
        written_at: UtcDateTime,
    ) -> CacheFuture<'a, ()>;

    fn save<'a>(&'a self, key: &'a SeriesKey, series: &'a CanonicalSeries) -> CacheFuture<'a, ()> {
        self.save_at(key, series, UtcDateTime::now())
    }
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    dir: PathBuf,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, key: &SeriesKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl CacheStore for FileCacheStore {
    fn load<'a>(&'a self, key: &'a SeriesKey) -> CacheFuture<'a, Option<CacheSnapshot>> {
        let path = self.snapshot_path(key);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || read_snapshot(&path))
                .await
                .map_err(|e| CacheError::Task(e.to_string()))?
        })
    }

    fn save_at<'a>(
        &'a self,
        key: &'a SeriesKey,
        series: &'a CanonicalSeries,
        written_at: UtcDateTime,
    ) -> CacheFuture<'a, ()> {
        let dir = self.dir.clone();
        let path = self.snapshot_path(key);
        let snapshot = CacheSnapshot {
            written_at,
            series: series.clone(),
        };
        Box::pin(async move {
            tokio::task::spawn_blocking(move || write_snapshot(&dir, &path, &snapshot))
                .await
                .map_err(|e| CacheError::Task(e.to_string()))?
        })
    }
}

fn read_snapshot(path: &Path) -> Result<Option<CacheSnapshot>, CacheError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Writes to a temp file in the target directory, then renames it over the
/// previous snapshot.
fn write_snapshot(dir: &Path, path: &Path, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
    std::fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| CacheError::Io(e.error))?;
    Ok(())
}

/// Process-local store for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    inner: Arc<RwLock<HashMap<SeriesKey, CacheSnapshot>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load<'a>(&'a self, key: &'a SeriesKey) -> CacheFuture<'a, Option<CacheSnapshot>> {
        Box::pin(async move { Ok(self.inner.read().await.get(key).cloned()) })
    }

    fn save_at<'a>(
        &'a self,
        key: &'a SeriesKey,
        series: &'a CanonicalSeries,
        written_at: UtcDateTime,
    ) -> CacheFuture<'a, ()> {
        Box::pin(async move {
            self.inner.write().await.insert(
                key.clone(),
                CacheSnapshot {
                    written_at,
                    series: series.clone(),
                },
            );
            Ok(())
        })
    }
}
