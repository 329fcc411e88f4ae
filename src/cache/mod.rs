//! Content-addressed cache for sync mapping artifacts (spec §4.3 step 7).
//!
//! Grounded on the teacher's `cache::lock_manager` for the `DashMap`
//! in-process layer; unlike the teacher's repository cache (which caches
//! whole clones), this cache is keyed by a per-mapping fingerprint and
//! holds the bytes the mapping last produced, on disk under
//! `.git-vendor/.cache/<fingerprint>`.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use crate::constants::{CACHE_DIRNAME, VENDOR_DIR};
use crate::core::GitVendorError;

/// The inputs a mapping's cache entry is keyed on. Per spec §4.2, the
/// position specifier MUST be part of `to` (or tracked alongside it) so
/// narrowing/widening a range invalidates the cache without the source
/// changing.
#[derive(Debug, Clone)]
pub struct CacheKey<'a> {
    pub commit_hash: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub exclude_patterns: &'a [String],
}

impl CacheKey<'_> {
    /// Computes the stable fingerprint for this key. Exclude patterns are
    /// sorted before hashing so that set order never affects the result.
    pub fn fingerprint(&self) -> String {
        let mut sorted: Vec<&str> = self.exclude_patterns.iter().map(String::as_str).collect();
        sorted.sort_unstable();

        let mut hasher = Sha256::new();
        hasher.update(self.commit_hash.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.from.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.to.as_bytes());
        for pattern in sorted {
            hasher.update(b"\0");
            hasher.update(pattern.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

/// A content-addressed cache of mapping output bytes, backed by an
/// in-process `DashMap` and an on-disk directory. Lookups check memory
/// first, then fall back to disk, populating memory on hit.
#[derive(Debug)]
pub struct ContentCache {
    root: PathBuf,
    memo: DashMap<String, Vec<u8>>,
}

impl ContentCache {
    /// Opens (without requiring it to exist yet) the cache directory under
    /// `project_root/.git-vendor/.cache`.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            root: project_root.as_ref().join(VENDOR_DIR).join(CACHE_DIRNAME),
            memo: DashMap::new(),
        }
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.root.join(fingerprint)
    }

    /// Returns the cached bytes for `fingerprint`, if any.
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<Vec<u8>>, GitVendorError> {
        if let Some(hit) = self.memo.get(fingerprint) {
            return Ok(Some(hit.clone()));
        }
        let path = self.entry_path(fingerprint);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|e| GitVendorError::io("read cache entry", path.display().to_string(), e))?;
        self.memo.insert(fingerprint.to_string(), bytes.clone());
        Ok(Some(bytes))
    }

    /// Stores `content` under `fingerprint`, both in memory and on disk.
    pub fn store(&self, fingerprint: &str, content: &[u8]) -> Result<(), GitVendorError> {
        std::fs::create_dir_all(&self.root).map_err(|e| GitVendorError::io("mkdir", self.root.display().to_string(), e))?;
        let path = self.entry_path(fingerprint);
        std::fs::write(&path, content).map_err(|e| GitVendorError::io("write cache entry", path.display().to_string(), e))?;
        self.memo.insert(fingerprint.to_string(), content.to_vec());
        Ok(())
    }

    /// Whether `fingerprint`'s cached content hashes the same as
    /// `dest_current_hash`, meaning the copy this mapping would perform is
    /// a no-op (spec §4.3 step 7).
    pub fn is_fresh(&self, fingerprint: &str, dest_current_hash: &str) -> Result<bool, GitVendorError> {
        let Some(cached) = self.lookup(fingerprint)? else {
            return Ok(false);
        };
        let mut hasher = Sha256::new();
        hasher.update(&cached);
        Ok(hex::encode(hasher.finalize()) == dest_current_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_under_exclude_reordering() {
        let a = CacheKey {
            commit_hash: "abc",
            from: "src",
            to: "dest",
            exclude_patterns: &["*.md".to_string(), "*.txt".to_string()],
        };
        let b = CacheKey {
            commit_hash: "abc",
            from: "src",
            to: "dest",
            exclude_patterns: &["*.txt".to_string(), "*.md".to_string()],
        };
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_position_suffix() {
        let a = CacheKey {
            commit_hash: "abc",
            from: "src",
            to: "dest:L5-L10",
            exclude_patterns: &[],
        };
        let b = CacheKey {
            commit_hash: "abc",
            from: "src",
            to: "dest:L5-L12",
            exclude_patterns: &[],
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn store_then_lookup_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.store("fp1", b"hello").unwrap();
        assert_eq!(cache.lookup("fp1").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn lookup_miss_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        assert_eq!(cache.lookup("nope").unwrap(), None);
    }

    #[test]
    fn is_fresh_matches_cached_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ContentCache::new(dir.path());
        cache.store("fp1", b"hello").unwrap();
        let mut hasher = Sha256::new();
        hasher.update(b"hello");
        let hash = hex::encode(hasher.finalize());
        assert!(cache.is_fresh("fp1", &hash).unwrap());
        assert!(!cache.is_fresh("fp1", "deadbeef").unwrap());
    }

    #[test]
    fn second_cache_instance_reads_disk_entries() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = ContentCache::new(dir.path());
            cache.store("fp1", b"persisted").unwrap();
        }
        let reopened = ContentCache::new(dir.path());
        assert_eq!(reopened.lookup("fp1").unwrap(), Some(b"persisted".to_vec()));
    }
}
