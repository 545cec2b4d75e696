// Merged subtitle storage
//
// Results are kept only for a limited time; the store is a narrow get/put
// interface so an external cache could stand in for the in-memory one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::source::ContentQuery;

/// Key-value storage for merged SRT text
pub trait ResultStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: String);
}

/// Identifies one merged version of one title and language pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MergeKey {
    pub content_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub primary_language: String,
    pub secondary_language: String,
    pub version: usize,
}

impl MergeKey {
    pub fn new(
        query: &ContentQuery,
        primary_language: &str,
        secondary_language: &str,
        version: usize,
    ) -> Self {
        Self {
            content_id: query.content_id.clone(),
            season: query.season,
            episode: query.episode,
            primary_language: primary_language.to_string(),
            secondary_language: secondary_language.to_string(),
            version,
        }
    }
}

impl fmt::Display for MergeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
        write!(
            f,
            "{}_{}_{}_{}_{}_v{}",
            self.content_id,
            part(self.season),
            part(self.episode),
            self.primary_language,
            self.secondary_language,
            self.version
        )
    }
}

/// In-process store whose entries expire after a fixed time-to-live
pub struct MemoryStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl MemoryStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Swept {} expired result(s)", removed);
        }
        removed
    }

    /// Entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => return Some(value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    fn put(&self, key: &str, value: String) {
        self.sweep();
        self.entries.lock().insert(key.to_string(), (Instant::now(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ContentKind;

    #[test]
    fn test_movie_key_has_empty_episode_parts() {
        let query = ContentQuery::parse_id("tt0111161", ContentKind::Movie, None, None).unwrap();
        let key = MergeKey::new(&query, "eng", "tur", 1);
        assert_eq!(key.to_string(), "0111161___eng_tur_v1");
    }

    #[test]
    fn test_episode_key() {
        let query = ContentQuery::parse_id("tt0903747:1:2", ContentKind::Series, None, None).unwrap();
        let key = MergeKey::new(&query, "eng", "spa", 3);
        assert_eq!(key.to_string(), "0903747_1_2_eng_spa_v3");
    }

    #[test]
    fn test_put_then_get() {
        let store = MemoryStore::new(Duration::from_secs(60));
        store.put("a", "first".to_string());
        assert_eq!(store.get("a"), Some("first".to_string()));
        assert_eq!(store.get("b"), None);

        store.put("a", "second".to_string());
        assert_eq!(store.get("a"), Some("second".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_entries_disappear() {
        let store = MemoryStore::new(Duration::from_millis(20));
        store.put("a", "value".to_string());
        std::thread::sleep(Duration::from_millis(40));

        assert_eq!(store.get("a"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = MemoryStore::new(Duration::from_millis(50));
        store.put("old", "value".to_string());
        std::thread::sleep(Duration::from_millis(80));
        store.entries.lock().insert("fresh".to_string(), (Instant::now(), "value".to_string()));

        assert_eq!(store.sweep(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("fresh"), Some("value".to_string()));
    }
}
