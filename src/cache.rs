//! Durable single-file snapshot of the notification collection.
//!
//! The file's modification time is the freshness clock: a snapshot older than
//! the TTL is reported as expired but is still readable.  Nothing here deletes
//! the file.
//!
//! There is no locking.  Two concurrent runs can race between read and write;
//! the tool assumes one process per user at a time.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use tracing::debug;

use crate::error::CacheError;
use crate::notifications::Notifications;

/// A persisted collection with a time-to-live.
pub trait ExpiringCache {
    /// Whether the snapshot is older than the TTL.  Errors when the snapshot's
    /// age cannot be determined (e.g. no file yet).
    fn expired(&self) -> Result<bool, CacheError>;

    /// Load the snapshot.  A missing file is not an error: it reads as an
    /// empty collection.
    fn read(&self) -> Result<Notifications, CacheError>;

    /// Replace the snapshot wholesale and refresh its timestamp.
    fn write(&self, notifications: &Notifications) -> Result<(), CacheError>;
}

impl<T: ExpiringCache + ?Sized> ExpiringCache for Rc<T> {
    fn expired(&self) -> Result<bool, CacheError> {
        (**self).expired()
    }

    fn read(&self) -> Result<Notifications, CacheError> {
        (**self).read()
    }

    fn write(&self, notifications: &Notifications) -> Result<(), CacheError> {
        (**self).write(notifications)
    }
}

/// JSON snapshot at a fixed path.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
    ttl: Duration,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>, ttl_in_hours: u64) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::from_secs(ttl_in_hours.saturating_mul(60 * 60)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        if source.kind() == ErrorKind::NotFound {
            CacheError::Missing {
                path: self.path.clone(),
            }
        } else {
            CacheError::Io {
                path: self.path.clone(),
                source,
            }
        }
    }

    /// Last time the snapshot was written.
    pub fn modified(&self) -> Result<SystemTime, CacheError> {
        fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|e| self.io_error(e))
    }

    /// Expiry as seen from `now`.  Separate from [`ExpiringCache::expired`] so
    /// the clock can be pinned in tests.
    pub fn expired_at(&self, now: SystemTime) -> Result<bool, CacheError> {
        let modified = self.modified()?;
        // A timestamp in the future (clock skew) counts as fresh.
        let age = now.duration_since(modified).unwrap_or_default();
        debug!(path = %self.path.display(), age_secs = age.as_secs(), "cache age");
        Ok(age > self.ttl)
    }
}

impl ExpiringCache for FileCache {
    fn expired(&self) -> Result<bool, CacheError> {
        self.expired_at(SystemTime::now())
    }

    fn read(&self) -> Result<Notifications, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Notifications::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, notifications: &Notifications) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec(notifications)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), count = notifications.len(), "cache written");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory cache for tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Notification;

    const MINUTE: Duration = Duration::from_secs(60);

    fn cache_in(dir: &tempfile::TempDir) -> FileCache {
        FileCache::new(dir.path().join("nested").join("cache.json"), 1)
    }

    #[test]
    fn read_without_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        assert!(cache.read().unwrap().is_empty());
    }

    #[test]
    fn expired_without_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        assert!(matches!(cache.expired(), Err(CacheError::Missing { .. })));
    }

    #[test]
    fn write_then_read_returns_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        let mut n = Notification::with_id("1");
        n.meta.done = true;
        let snapshot: Notifications = vec![n, Notification::with_id("2")].into();

        cache.write(&snapshot).unwrap();

        assert_eq!(cache.read().unwrap(), snapshot);
        assert!(!cache.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);

        cache
            .write(&vec![Notification::with_id("old")].into())
            .unwrap();
        cache
            .write(&vec![Notification::with_id("new")].into())
            .unwrap();

        assert_eq!(cache.read().unwrap().id_list(), vec!["new"]);
    }

    #[test]
    fn freshness_follows_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.write(&Notifications::new()).unwrap();
        let written = cache.modified().unwrap();

        assert!(!cache.expired_at(written + 30 * MINUTE).unwrap());
        assert!(cache.expired_at(written + 90 * MINUTE).unwrap());
    }

    #[test]
    fn huge_ttl_saturates_instead_of_overflowing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache.json"), u64::MAX);
        cache.write(&Notifications::new()).unwrap();
        let written = cache.modified().unwrap();

        assert!(!cache.expired_at(written + 10_000 * 24 * 60 * MINUTE).unwrap());
    }

    #[test]
    fn freshly_written_cache_is_not_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        cache.write(&Notifications::new()).unwrap();

        assert!(!cache.expired().unwrap());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(&dir);
        fs::create_dir_all(cache.path().parent().unwrap()).unwrap();
        fs::write(cache.path(), b"{not json").unwrap();

        assert!(matches!(cache.read(), Err(CacheError::Corrupt { .. })));
    }
}
