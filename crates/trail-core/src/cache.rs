//! Parsed-log cache for the batch entry point.
//!
//! The first [`ParsedLogCache::get_or_load`] for a path reads, splits and
//! normalises the whole file; later calls for the same path hand back the same
//! `Arc` without touching the loader. There is no time-based expiry and no
//! invalidation on file change: staleness is accepted for batch reads and the
//! live-tail path never goes through here.
//!
//! Which entries survive is decided by the [`CachePolicy`]:
//!
//! | Policy | Behaviour |
//! |--------|-----------|
//! | `SingleSlot` | one cached file; loading another path evicts it |
//! | `Keyed { max_entries }` | one entry per path; oldest load evicted when full |

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::batch::{parse_logs, read_log_file};
use crate::error::IngestError;
use crate::normalizer::{IdGenerator, RandomIds, RecordNormalizer};
use crate::types::CanonicalRecord;

/// Produces the raw lines for a path. Swapped out in tests to count reads.
pub trait LogLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>, IngestError>;
}

/// Reads from the local filesystem via [`read_log_file`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl LogLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<Vec<String>, IngestError> {
        read_log_file(path)
    }
}

/// Eviction policy for [`ParsedLogCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    SingleSlot,
    /// `None` means unbounded.
    Keyed { max_entries: Option<usize> },
}

impl CachePolicy {
    fn capacity(self) -> Option<usize> {
        match self {
            CachePolicy::SingleSlot => Some(1),
            CachePolicy::Keyed { max_entries } => max_entries.map(|n| n.max(1)),
        }
    }
}

/// Memoised batch results keyed by source path.
#[derive(Debug)]
pub struct ParsedLogCache<L = FsLoader, G = RandomIds> {
    loader: L,
    normalizer: RecordNormalizer<G>,
    policy: CachePolicy,
    entries: HashMap<PathBuf, Arc<[CanonicalRecord]>>,
    /// Paths in load order, oldest first.
    order: VecDeque<PathBuf>,
}

impl ParsedLogCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self::with_parts(FsLoader, RecordNormalizer::new(), policy)
    }
}

impl<L: LogLoader, G: IdGenerator> ParsedLogCache<L, G> {
    pub fn with_parts(loader: L, normalizer: RecordNormalizer<G>, policy: CachePolicy) -> Self {
        Self {
            loader,
            normalizer,
            policy,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Return the normalised records for `path`, loading them on first use.
    ///
    /// Unparseable lines are skipped (and logged); only file-level errors are
    /// returned.
    pub fn get_or_load(&mut self, path: impl AsRef<Path>) -> Result<Arc<[CanonicalRecord]>, IngestError> {
        let path = path.as_ref();
        if let Some(records) = self.entries.get(path) {
            tracing::debug!(path = %path.display(), "using cached logs");
            return Ok(Arc::clone(records));
        }

        tracing::info!(path = %path.display(), "reading log file");
        let lines = self.loader.load(path)?;
        let batch = parse_logs(&self.normalizer, &lines);
        if !batch.errors.is_empty() {
            tracing::warn!(
                path = %path.display(),
                skipped = batch.errors.len(),
                loaded = batch.records.len(),
                "some log lines could not be parsed"
            );
        }

        let records: Arc<[CanonicalRecord]> = batch.records.into();
        self.insert(path.to_path_buf(), Arc::clone(&records));
        Ok(records)
    }

    /// Drop the entry for `path`. Returns whether one was cached.
    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.order.retain(|p| p != path);
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.entries.contains_key(path.as_ref())
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    fn insert(&mut self, path: PathBuf, records: Arc<[CanonicalRecord]>) {
        if let Some(capacity) = self.policy.capacity() {
            while self.order.len() >= capacity {
                let Some(evicted) = self.order.pop_front() else {
                    break;
                };
                tracing::debug!(path = %evicted.display(), "evicting cached logs");
                self.entries.remove(&evicted);
            }
        }
        self.order.push_back(path.clone());
        self.entries.insert(path, records);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::SequentialIds;
    use std::cell::RefCell;

    const LINE: &str = r#"{"DownstreamStatus":404,"Duration":12000000,"RequestHost":"h","RequestMethod":"GET","RequestPath":"/404","RequestProtocol":"HTTP/1.1","RequestScheme":"http","StartUTC":"2025-03-01T12:00:00Z","msg":""}"#;

    /// Serves the same two lines for any path and records every call.
    #[derive(Default)]
    struct CountingLoader {
        calls: RefCell<Vec<PathBuf>>,
    }

    impl LogLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<Vec<String>, IngestError> {
            self.calls.borrow_mut().push(path.to_path_buf());
            Ok(vec![LINE.to_string(), "not json".to_string()])
        }
    }

    fn cache(policy: CachePolicy) -> ParsedLogCache<CountingLoader, SequentialIds> {
        ParsedLogCache::with_parts(
            CountingLoader::default(),
            RecordNormalizer::with_ids(SequentialIds::new()),
            policy,
        )
    }

    #[test]
    fn second_call_hits_cache() {
        let mut cache = cache(CachePolicy::SingleSlot);
        let first = cache.get_or_load("a.log").unwrap();
        let second = cache.get_or_load("a.log").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(cache.loader.calls.borrow().len(), 1);
    }

    #[test]
    fn single_slot_evicts_previous_path() {
        let mut cache = cache(CachePolicy::SingleSlot);
        cache.get_or_load("a.log").unwrap();
        cache.get_or_load("b.log").unwrap();
        assert!(!cache.contains("a.log"));
        assert!(cache.contains("b.log"));
        cache.get_or_load("a.log").unwrap();
        assert_eq!(cache.loader.calls.borrow().len(), 3);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keyed_retains_up_to_capacity() {
        let mut cache = cache(CachePolicy::Keyed { max_entries: Some(2) });
        cache.get_or_load("a.log").unwrap();
        cache.get_or_load("b.log").unwrap();
        cache.get_or_load("a.log").unwrap();
        assert_eq!(cache.loader.calls.borrow().len(), 2);

        cache.get_or_load("c.log").unwrap();
        assert!(!cache.contains("a.log"), "oldest load is evicted first");
        assert!(cache.contains("b.log") && cache.contains("c.log"));
    }

    #[test]
    fn unbounded_keyed_never_evicts() {
        let mut cache = cache(CachePolicy::Keyed { max_entries: None });
        for i in 0..50 {
            cache.get_or_load(format!("{i}.log")).unwrap();
        }
        assert_eq!(cache.len(), 50);
    }

    #[test]
    fn invalidate_forces_reload() {
        let mut cache = cache(CachePolicy::SingleSlot);
        let first = cache.get_or_load("a.log").unwrap();
        assert!(cache.invalidate("a.log"));
        assert!(!cache.invalidate("a.log"));
        let second = cache.get_or_load("a.log").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first[0].id, second[0].id);
        assert_eq!(cache.loader.calls.borrow().len(), 2);
    }

    #[test]
    fn file_errors_propagate_and_cache_nothing() {
        let mut cache = ParsedLogCache::new(CachePolicy::SingleSlot);
        let err = cache.get_or_load("/definitely/not/here.log").unwrap_err();
        assert!(matches!(err, IngestError::FileAccess { .. }));
        assert!(cache.is_empty());
    }
}
