//! Time-bounded on-disk lookup cache.
//!
//! One JSON file per normalized query key holds `{key, timestamp, payload}`.
//! Reads never fail: a missing, corrupt, or stale file is simply a miss.
//! Writes overwrite in place (via a temporary file and rename) and then
//! enforce a count bound by evicting the oldest-written files.

use chrono::Utc;
use mealwise_core::{
    compute_content_hash, CacheConfig, CacheEntry, MealwiseResult, StorageError, Timestamp,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// Longest sanitized query kept verbatim in a file name.
const MAX_KEY_CHARS: usize = 96;

/// Hex digits of the SHA-256 digest appended to lossy keys.
const KEY_HASH_HEX_LEN: usize = 16;

const CACHE_FILE_EXT: &str = "json";

/// Derive the normalized cache key for a query.
///
/// Only alphanumeric characters, space, and underscore survive, and the
/// result is trimmed and shortened. If the result differs from the raw query
/// in any way (including trimmed whitespace), or nothing survived, a digest
/// of the raw query is appended so that distinct queries cannot collide on
/// one file.
pub fn cache_key(query: &str) -> String {
    let kept: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    let base: String = kept.trim().chars().take(MAX_KEY_CHARS).collect();
    let base = base.trim_end();

    if !base.is_empty() && base == query {
        return base.to_string();
    }

    let digest = hex::encode(compute_content_hash(query.as_bytes()));
    let digest = &digest[..KEY_HASH_HEX_LEN];
    if base.is_empty() {
        digest.to_string()
    } else {
        format!("{}-{}", base, digest)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fresh entries returned
    pub hits: u64,
    /// Lookups with no usable entry
    pub misses: u64,
    /// Entries that existed but were past their TTL
    pub stale: u64,
    /// Entries that could not be decoded
    pub corrupt: u64,
    /// Files removed to stay within the count bound
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    corrupt: AtomicU64,
    evictions: AtomicU64,
}

/// File-per-key lookup cache with passive TTL expiry.
#[derive(Debug)]
pub struct LookupCache {
    dir: PathBuf,
    ttl: Duration,
    max_entries: usize,
    counters: Counters,
}

impl LookupCache {
    /// Create a cache rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, max_entries: usize) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            max_entries: max_entries.max(1),
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone(), config.ttl(), config.max_entries)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// File backing `query`.
    pub fn path_for(&self, query: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", cache_key(query), CACHE_FILE_EXT))
    }

    /// Fresh payload for `query`, or `None`.
    pub fn get(&self, query: &str) -> Option<serde_json::Value> {
        self.get_at(query, Utc::now()).map(|entry| entry.payload)
    }

    /// Fresh entry for `query` as judged at `now`.
    pub fn get_at(&self, query: &str, now: Timestamp) -> Option<CacheEntry> {
        let path = self.path_for(query);

        let entry = match read_entry(&path) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable cache entry");
                self.counters.corrupt.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        if !entry.is_fresh(now, self.ttl) {
            tracing::debug!(
                key = %entry.key,
                age_secs = entry.age(now).as_secs(),
                "Cache entry is stale"
            );
            self.counters.stale.fetch_add(1, Ordering::Relaxed);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        tracing::debug!(key = %entry.key, "Cache hit");
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry)
    }

    /// Store `payload` under `query`, stamped now.
    pub fn put(&self, query: &str, payload: serde_json::Value) -> MealwiseResult<()> {
        self.put_at(query, payload, Utc::now())
    }

    /// Store `payload` under `query` with an explicit timestamp.
    pub fn put_at(
        &self,
        query: &str,
        payload: serde_json::Value,
        timestamp: Timestamp,
    ) -> MealwiseResult<()> {
        let path = self.path_for(query);
        let entry = CacheEntry::new(cache_key(query), timestamp, payload);

        std::fs::create_dir_all(&self.dir).map_err(|e| write_failed(&self.dir, e))?;
        let contents = serde_json::to_vec_pretty(&entry).map_err(|e| write_failed(&path, e))?;
        write_atomically(&path, &contents)?;

        self.enforce_bound(&path);
        Ok(())
    }

    /// Number of entry files currently on disk.
    pub fn len(&self) -> usize {
        self.entry_files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stale: self.counters.stale.load(Ordering::Relaxed),
            corrupt: self.counters.corrupt.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    fn entry_files(&self) -> Vec<(SystemTime, PathBuf)> {
        let Ok(read_dir) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().and_then(|ext| ext.to_str()) == Some(CACHE_FILE_EXT)
            })
            .map(|path| {
                let modified = std::fs::metadata(&path)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, path)
            })
            .collect()
    }

    /// Evict oldest-written files beyond `max_entries`, never `keep`.
    fn enforce_bound(&self, keep: &Path) {
        let mut files = self.entry_files();
        if files.len() <= self.max_entries {
            return;
        }
        files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let excess = files.len() - self.max_entries;
        for (_, path) in files.into_iter().filter(|(_, p)| p != keep).take(excess) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(path = %path.display(), "Evicted cache entry");
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to evict cache entry");
                }
            }
        }
    }
}

fn read_entry(path: &Path) -> MealwiseResult<Option<CacheEntry>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into())
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| {
            StorageError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Write via a sibling temporary file and rename over the target.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> MealwiseResult<()> {
    let tmp = write_temp(path, contents)?;
    commit_temp(&tmp, path)
}

/// Write `contents` to the temporary sibling of `path` and return its path.
pub(crate) fn write_temp(path: &Path, contents: &[u8]) -> MealwiseResult<PathBuf> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents).map_err(|e| {
        discard_temp(&tmp);
        write_failed(&tmp, e)
    })?;
    Ok(tmp)
}

/// Rename a temporary file written by [`write_temp`] over `path`.
pub(crate) fn commit_temp(tmp: &Path, path: &Path) -> MealwiseResult<()> {
    std::fs::rename(tmp, path).map_err(|e| {
        discard_temp(tmp);
        write_failed(path, e)
    })
}

/// Best-effort removal of an uncommitted temporary file.
pub(crate) fn discard_temp(tmp: &Path) {
    if tmp.is_file() {
        let _ = std::fs::remove_file(tmp);
    }
}

pub(crate) fn write_failed(path: &Path, e: impl std::fmt::Display) -> mealwise_core::MealwiseError {
    StorageError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
    .into()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache_in(dir: &Path) -> LookupCache {
        LookupCache::new(dir.join("cache"), Duration::from_secs(3600), 1000)
    }

    #[test]
    fn test_cache_key_keeps_plain_queries() {
        assert_eq!(cache_key("kimchi"), "kimchi");
        assert_eq!(cache_key("pork cutlet"), "pork cutlet");
        assert_eq!(cache_key("kimchi_stew"), "kimchi_stew");
        assert_eq!(cache_key("돈까스"), "돈까스");
    }

    #[test]
    fn test_cache_key_distinguishes_surrounding_whitespace() {
        let padded = cache_key(" kimchi");
        assert!(padded.starts_with("kimchi-"));
        assert_ne!(padded, cache_key("kimchi"));
        assert_ne!(padded, cache_key("kimchi "));
    }

    #[test]
    fn test_cache_key_hashes_lossy_queries() {
        let a = cache_key("kimchi/stew");
        let b = cache_key("kimchi.stew");
        assert!(a.starts_with("kimchistew-"));
        assert_ne!(a, b);
        assert_ne!(a, cache_key("kimchistew"));
    }

    #[test]
    fn test_cache_key_for_symbols_only_is_digest() {
        let key = cache_key("../..");
        assert_eq!(key.len(), KEY_HASH_HEX_LEN);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cache_key_truncates_long_queries() {
        let long = "a".repeat(300);
        let key = cache_key(&long);
        assert!(key.len() <= MAX_KEY_CHARS + 1 + KEY_HASH_HEX_LEN);
        assert_ne!(key, cache_key(&"a".repeat(299)));
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        assert!(cache.get("kimchi").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_then_get_returns_payload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let payload = json!({"body": {"items": [{"FOOD_NM": "kimchi"}]}});

        cache.put("kimchi", payload.clone()).unwrap();

        assert_eq!(cache.get("kimchi"), Some(payload));
        assert_eq!(cache.stats().hits, 1);
        assert!(cache.path_for("kimchi").exists());
    }

    #[test]
    fn test_entry_is_fresh_until_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let t0 = Utc::now();
        cache.put_at("kimchi", json!(1), t0).unwrap();

        assert!(cache
            .get_at("kimchi", t0 + chrono::Duration::seconds(3599))
            .is_some());
        assert!(cache
            .get_at("kimchi", t0 + chrono::Duration::seconds(3600))
            .is_none());
        assert_eq!(cache.stats().stale, 1);
    }

    #[test]
    fn test_stale_entry_is_not_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let t0 = Utc::now() - chrono::Duration::hours(5);
        cache.put_at("kimchi", json!(1), t0).unwrap();

        assert!(cache.get("kimchi").is_none());
        assert!(cache.path_for("kimchi").exists());
    }

    #[test]
    fn test_corrupt_entry_is_miss_and_overwritable() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.path_for("kimchi"), b"{not json").unwrap();

        assert!(cache.get("kimchi").is_none());
        assert_eq!(cache.stats().corrupt, 1);

        cache.put("kimchi", json!({"ok": true})).unwrap();
        assert_eq!(cache.get("kimchi"), Some(json!({"ok": true})));
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        cache.put("kimchi", json!(1)).unwrap();
        cache.put("kimchi", json!(2)).unwrap();
        assert_eq!(cache.get("kimchi"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_enforces_max_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LookupCache::new(dir.path().join("cache"), Duration::from_secs(3600), 2);

        cache.put("apple", json!(1)).unwrap();
        cache.put("banana", json!(2)).unwrap();
        cache.put("cabbage", json!(3)).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("cabbage"), Some(json!(3)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Keys are deterministic and file-name safe.
        #[test]
        fn prop_cache_key_deterministic_and_safe(query in ".{0,120}") {
            let a = cache_key(&query);
            let b = cache_key(&query);
            prop_assert_eq!(&a, &b);
            prop_assert!(!a.is_empty());
            prop_assert!(a.chars().all(|c| c.is_alphanumeric() || c == ' ' || c == '_' || c == '-'));
        }

        /// Distinct queries that sanitize lossily never share a key.
        #[test]
        fn prop_lossy_queries_do_not_collide(a in "[a-z]{1,10}[./]", b in "[a-z]{1,10}[./]") {
            prop_assume!(a != b);
            prop_assert_ne!(cache_key(&a), cache_key(&b));
        }
    }
}
