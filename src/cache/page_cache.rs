use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::notion::Page;

struct Entry {
    page: Page,
    inserted_at: Instant,
}

impl Entry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

/// Thread-safe LRU cache of upstream pages with a TTL
///
/// Advisory only: an empty or expired cache changes latency, never results.
/// Writers only add pages; a live entry is never overwritten.
pub struct PageCache {
    cache: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl PageCache {
    /// Create a new page cache
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of pages to hold (floored at 1)
    /// * `ttl` - How long an entry stays valid after insertion
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
            ttl,
        }
    }

    /// Cached page for `id`, if present and not expired
    pub fn get(&self, id: &str) -> Option<Page> {
        let mut cache = self.cache.lock().unwrap();
        match cache.get(id) {
            Some(entry) if entry.is_fresh(self.ttl) => return Some(entry.page.clone()),
            Some(_) => {}
            None => return None,
        }
        cache.pop(id);
        None
    }

    /// Store `page` unless a live entry for its id already exists
    ///
    /// Returns true when the page was inserted.
    pub fn insert_if_absent(&self, page: Page) -> bool {
        let mut cache = self.cache.lock().unwrap();
        if let Some(entry) = cache.peek(&page.id) {
            if entry.is_fresh(self.ttl) {
                return false;
            }
        }
        cache.put(
            page.id.clone(),
            Entry {
                page,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of held entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().unwrap().is_empty()
    }

    /// Drop every entry, returning how many were held
    pub fn clear(&self) -> usize {
        let mut cache = self.cache.lock().unwrap();
        let cleared = cache.len();
        cache.clear();
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG: Duration = Duration::from_secs(300);

    #[test]
    fn test_cache_insert_and_get() {
        let cache = PageCache::new(10, LONG);
        assert!(cache.insert_if_absent(Page::bare("p1")));
        assert_eq!(cache.get("p1").map(|p| p.id), Some("p1".to_string()));
        assert!(cache.get("p2").is_none());
    }

    #[test]
    fn test_live_entry_not_overwritten() {
        let cache = PageCache::new(10, LONG);
        let mut first = Page::bare("p1");
        first.url = Some("https://first".into());
        let mut second = Page::bare("p1");
        second.url = Some("https://second".into());

        assert!(cache.insert_if_absent(first));
        assert!(!cache.insert_if_absent(second));
        assert_eq!(cache.get("p1").unwrap().url.as_deref(), Some("https://first"));
    }

    #[test]
    fn test_expired_entries_miss_and_can_be_replaced() {
        let cache = PageCache::new(10, Duration::from_millis(30));
        cache.insert_if_absent(Page::bare("p1"));
        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.get("p1").is_none());
        assert!(cache.is_empty());
        assert!(cache.insert_if_absent(Page::bare("p1")));
        assert!(cache.get("p1").is_some());
    }

    #[test]
    fn test_cache_eviction() {
        let cache = PageCache::new(2, LONG);
        cache.insert_if_absent(Page::bare("p1"));
        cache.insert_if_absent(Page::bare("p2"));
        cache.insert_if_absent(Page::bare("p3"));

        assert!(cache.get("p1").is_none());
        assert!(cache.get("p2").is_some());
        assert!(cache.get("p3").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear_reports_count() {
        let cache = PageCache::new(10, LONG);
        cache.insert_if_absent(Page::bare("p1"));
        cache.insert_if_absent(Page::bare("p2"));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.clear(), 0);
    }

    #[test]
    fn test_zero_capacity_floors_to_one() {
        let cache = PageCache::new(0, LONG);
        cache.insert_if_absent(Page::bare("p1"));
        assert_eq!(cache.len(), 1);
    }
}
