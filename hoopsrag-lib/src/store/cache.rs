use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::normalize::Language;
use crate::store::MemoryIndex;
use crate::{Error, Result};

/// Bump when the cached layout changes
const CACHE_VERSION: u32 = 1;

/// Everything an index depends on.
///
/// Two builds with equal keys produce the same index, so a cached copy can
/// stand in for a rebuild.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKey {
    /// Digest of the raw statistics file
    pub fingerprint: String,
    pub delimiter: u8,
    pub language: Language,
    pub include_metadata: bool,
    pub model: String,
}

impl CacheKey {
    fn digest(&self) -> String {
        let mut hasher = DefaultHasher::new();
        CACHE_VERSION.hash(&mut hasher);
        self.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    key: CacheKey,
    index: MemoryIndex,
}

/// On-disk store of built indexes, one JSON file per [`CacheKey`].
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File that holds the index for `key`
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }

    /// Load a cached index.
    ///
    /// `Ok(None)` means a miss: no file, or a file written for another key or
    /// cache version. A file that does not parse, or holds an inconsistent
    /// index, is an [`Error::Cache`].
    pub fn load(&self, key: &CacheKey) -> Result<Option<MemoryIndex>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "index cache miss");
                return Ok(None);
            }
            Err(e) => return Err(Error::Cache(format!("cannot read {}: {e}", path.display()))),
        };

        let file: CacheFile = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Cache(format!("corrupt cache file {}: {e}", path.display())))?;

        if file.version != CACHE_VERSION || &file.key != key {
            warn!(path = %path.display(), "ignoring stale index cache");
            return Ok(None);
        }

        debug!(path = %path.display(), documents = file.index.entries().len(), "index cache hit");
        Ok(Some(file.index))
    }

    /// Save `index` under `key`, replacing any previous copy.
    pub fn save(&self, key: &CacheKey, index: &MemoryIndex) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::Cache(format!("cannot create {}: {e}", self.dir.display())))?;

        let path = self.path_for(key);
        let file = CacheFile {
            version: CACHE_VERSION,
            key: key.clone(),
            index: index.clone(),
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| Error::Cache(e.to_string()))?;

        // write then rename so a crash never leaves a half-written file behind
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|e| Error::Cache(format!("cannot write {}: {e}", path.display())))?;

        debug!(path = %path.display(), "saved index cache");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::NormalizedDocument;
    use crate::store::VectorStore;

    fn key(model: &str) -> CacheKey {
        CacheKey {
            fingerprint: "00ff".to_string(),
            delimiter: b';',
            language: Language::Turkish,
            include_metadata: false,
            model: model.to_string(),
        }
    }

    fn sample_index() -> MemoryIndex {
        MemoryIndex::new(
            "m",
            vec![
                NormalizedDocument::new("alpha", None),
                NormalizedDocument::new("beta", None),
            ],
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_miss_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());
        assert!(cache.load(&key("m")).unwrap().is_none());
    }

    #[test]
    fn test_saved_index_ranks_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path().join("nested"));
        let index = sample_index();

        cache.save(&key("m"), &index).unwrap();
        let loaded = cache.load(&key("m")).unwrap().unwrap();

        let query = vec![0.2, 0.9];
        assert_eq!(loaded.search(&query, 2).unwrap(), index.search(&query, 2).unwrap());
    }

    #[test]
    fn test_keys_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());

        cache.save(&key("model-a"), &sample_index()).unwrap();
        assert!(cache.load(&key("model-b")).unwrap().is_none());
        assert_ne!(cache.path_for(&key("model-a")), cache.path_for(&key("model-b")));
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());
        fs::write(cache.path_for(&key("m")), b"not json").unwrap();

        assert!(matches!(cache.load(&key("m")), Err(Error::Cache(_))));
    }

    #[test]
    fn test_ragged_vectors_are_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(dir.path());
        let path = cache.save(&key("m"), &sample_index()).unwrap();

        let mut stored: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        stored["index"]["entries"][1]["embedding"] = serde_json::json!([1.0]);
        fs::write(&path, serde_json::to_vec(&stored).unwrap()).unwrap();

        assert!(matches!(cache.load(&key("m")), Err(Error::Cache(_))));
    }
}
