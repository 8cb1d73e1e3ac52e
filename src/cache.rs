//! Pass-through caching of derived results.
//!
//! The aggregators stay pure; callers that run several aggregations
//! over the same data hold a [`DerivedCache`] and key it by source
//! fingerprint plus parameters. A key changes whenever the underlying
//! source file or the requested parameters change, so stale reuse is
//! structurally impossible.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tracing::debug;

fn digest16(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    let result = hasher.finalize();
    hex::encode(result)[..16].to_string()
}

/// Fingerprint of a data source's identity.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceId(String);

impl SourceId {
    /// Digest arbitrary identity fields, SHA-256 truncated to 16 hex
    /// characters.
    pub fn generate(fields: &[&str]) -> Self {
        Self(digest16(fields))
    }

    /// Fingerprint a source file by path, size and modification time.
    ///
    /// Cheap identity, not a content hash: touching the file rotates
    /// the fingerprint even when bytes stayed the same, which only
    /// costs a recompute.
    pub fn for_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Self::generate(&[
            &path.to_string_lossy(),
            &meta.len().to_string(),
            &mtime.to_string(),
        ]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

/// Cache key: source fingerprint plus aggregation parameters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(source: &SourceId, params: &[&str]) -> Self {
        let mut fields = vec![source.as_str()];
        fields.extend_from_slice(params);
        Self(digest16(&fields))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.0)
    }
}

/// In-memory cache of derived values, keyed by [`CacheKey`].
#[derive(Default)]
pub struct DerivedCache<T> {
    entries: HashMap<CacheKey, T>,
}

impl<T> DerivedCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the cached value for `key`, computing it on first use.
    pub fn get_or_compute<F: FnOnce() -> T>(&mut self, key: CacheKey, compute: F) -> &T {
        if !self.entries.contains_key(&key) {
            debug!("Cache miss for {}", key);
        }
        self.entries.entry(key).or_insert_with(compute)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_id_deterministic() {
        let a = SourceId::generate(&["data/raw/rankedData.db", "1024", "1700000000"]);
        let b = SourceId::generate(&["data/raw/rankedData.db", "1024", "1700000000"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_for_path_tracks_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rankedData.db");

        fs::write(&path, b"one").unwrap();
        let before = SourceId::for_path(&path).unwrap();

        fs::write(&path, b"one plus more").unwrap();
        let after = SourceId::for_path(&path).unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn test_key_changes_with_params() {
        let source = SourceId::generate(&["db"]);
        let a = CacheKey::new(&source, &["2022-10-01", "2022-12-19", "30"]);
        let b = CacheKey::new(&source, &["2022-10-01", "2022-12-19", "20"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let source = SourceId::generate(&["db"]);
        let key = CacheKey::new(&source, &["params"]);

        let mut cache: DerivedCache<u64> = DerivedCache::new();
        let mut calls = 0;

        let first = *cache.get_or_compute(key.clone(), || {
            calls += 1;
            41
        });
        let second = *cache.get_or_compute(key, || {
            calls += 1;
            99
        });

        assert_eq!(first, 41);
        assert_eq!(second, 41);
        assert_eq!(calls, 1);
    }
}
