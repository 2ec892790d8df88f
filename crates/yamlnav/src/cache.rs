//! Per-source memoization of extraction results with logical TTL expiry.
//!
//! Entries are keyed by source identity (a file path or the `current`
//! sentinel). Expired entries read as absent but are only dropped when
//! overwritten or cleared.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use yamlnav_core::{Node, PathEntry, ValueEntry};

/// Monotonic time source.
pub trait Clock: std::fmt::Debug + Send + Sync {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone)]
struct Stamped<V> {
    value: V,
    stamp: Duration,
}

/// One keyed store.
#[derive(Debug, Clone)]
pub struct TtlStore<V> {
    name: &'static str,
    entries: HashMap<String, Stamped<V>>,
}

impl<V> TtlStore<V> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn get(&self, key: &str, now: Duration, ttl: Duration) -> Option<&V> {
        let entry = self.entries.get(key)?;
        if now.saturating_sub(entry.stamp) >= ttl {
            return None;
        }
        Some(&entry.value)
    }

    fn set(&mut self, key: &str, value: V, now: Duration) {
        self.entries
            .insert(key.to_string(), Stamped { value, stamp: now });
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored records, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Access to one store of a [`Cache`], bound to the cache's clock and policy.
#[derive(Debug)]
pub struct Store<'c, V> {
    store: &'c mut TtlStore<V>,
    enabled: bool,
    ttl: Duration,
    now: Duration,
}

impl<V: Clone> Store<'_, V> {
    /// The live value for `key`.
    ///
    /// Absent when caching is disabled, the key is empty, missing or older
    /// than the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        if !self.enabled || key.is_empty() {
            return None;
        }
        let hit = self.store.get(key, self.now, self.ttl).cloned();
        tracing::debug!(store = self.store.name, key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store `value` under `key`. Ignored when disabled or `key` is empty.
    pub fn set(&mut self, key: &str, value: V) {
        if !self.enabled || key.is_empty() {
            return;
        }
        self.store.set(key, value, self.now);
    }
}

/// The four extraction stores.
#[derive(Debug)]
pub struct Cache {
    enabled: bool,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    paths: TtlStore<Vec<PathEntry>>,
    values: TtlStore<Vec<ValueEntry>>,
    lines: TtlStore<Vec<String>>,
    parsed: TtlStore<Node>,
}

impl Cache {
    #[must_use]
    pub fn new(enabled: bool, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled,
            ttl,
            clock,
            paths: TtlStore::new("paths"),
            values: TtlStore::new("values"),
            lines: TtlStore::new("lines"),
            parsed: TtlStore::new("parsed"),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn view<V>(
        store: &mut TtlStore<V>,
        enabled: bool,
        ttl: Duration,
        now: Duration,
    ) -> Store<'_, V> {
        Store {
            store,
            enabled,
            ttl,
            now,
        }
    }

    pub fn paths(&mut self) -> Store<'_, Vec<PathEntry>> {
        let now = self.clock.now();
        Self::view(&mut self.paths, self.enabled, self.ttl, now)
    }

    pub fn values(&mut self) -> Store<'_, Vec<ValueEntry>> {
        let now = self.clock.now();
        Self::view(&mut self.values, self.enabled, self.ttl, now)
    }

    pub fn lines(&mut self) -> Store<'_, Vec<String>> {
        let now = self.clock.now();
        Self::view(&mut self.lines, self.enabled, self.ttl, now)
    }

    pub fn parsed(&mut self) -> Store<'_, Node> {
        let now = self.clock.now();
        Self::view(&mut self.parsed, self.enabled, self.ttl, now)
    }

    /// Remove `key` from every store, or empty every store when `key` is
    /// `None`.
    pub fn clear(&mut self, key: Option<&str>) {
        match key {
            Some(key) => {
                self.paths.remove(key);
                self.values.remove(key);
                self.lines.remove(key);
                self.parsed.remove(key);
            }
            None => {
                self.paths.clear();
                self.values.clear();
                self.lines.clear();
                self.parsed.clear();
            }
        }
        tracing::debug!(key, "cache cleared");
    }

    /// Records held across all stores, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len() + self.values.len() + self.lines.len() + self.parsed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Cache, ManualClock};
    use std::sync::Arc;
    use std::time::Duration;

    fn cache(enabled: bool) -> (Cache, ManualClock) {
        let clock = ManualClock::new();
        let cache = Cache::new(enabled, Duration::from_secs(300), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn round_trip() {
        let (mut cache, _) = cache(true);
        cache.lines().set("a.yaml", vec!["a: 1".to_string()]);
        assert_eq!(cache.lines().get("a.yaml"), Some(vec!["a: 1".to_string()]));
        assert_eq!(cache.lines().get("b.yaml"), None);
        assert_eq!(cache.paths().get("a.yaml"), None);
    }

    #[test]
    fn entries_expire_at_ttl() {
        let (mut cache, clock) = cache(true);
        cache.lines().set("current", vec![]);
        clock.advance(Duration::from_secs(299));
        assert!(cache.lines().get("current").is_some());
        clock.advance(Duration::from_secs(1));
        assert!(cache.lines().get("current").is_none());
        // logical expiry only
        assert_eq!(cache.len(), 1);

        cache.lines().set("current", vec![]);
        assert!(cache.lines().get("current").is_some());
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let (mut cache, _) = cache(false);
        cache.lines().set("a.yaml", vec![]);
        assert!(cache.lines().get("a.yaml").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn empty_key_is_never_stored() {
        let (mut cache, _) = cache(true);
        cache.lines().set("", vec![]);
        assert!(cache.lines().get("").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_one_key_or_everything() {
        let (mut cache, _) = cache(true);
        cache.lines().set("a", vec![]);
        cache.paths().set("a", vec![]);
        cache.lines().set("b", vec![]);

        cache.clear(Some("a"));
        assert!(cache.lines().get("a").is_none());
        assert!(cache.paths().get("a").is_none());
        assert!(cache.lines().get("b").is_some());

        cache.clear(None);
        assert!(cache.is_empty());
    }
}
