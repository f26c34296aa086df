//! Widget references, definitions and the resolution cache.
//!
//! A widget is an externally authored sub-tree. The document only holds a
//! `widgetInstance` leaf carrying an instance id; the materialized widget lives
//! in the [`WidgetRefStore`] under that id and is never merged into the
//! document's node map.
//!
//! Definitions are fetched through the [`WidgetService`] trait and kept in a
//! [`WidgetCache`] for a fixed TTL (5 minutes by default). Expiry is lazy:
//! stale entries are evicted on lookup.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;
use crate::node::ComponentNode;

// ============================================================================
// Identity
// ============================================================================

/// Semantic version of a widget, `major.minor.patch` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl Version {
    /// Create a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format!("invalid version {s:?}: expected major.minor.patch"));
        };
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|e| format!("invalid version {s:?}: {e}"))
        };
        Ok(Self::new(parse(*major)?, parse(*minor)?, parse(*patch)?))
    }
}

impl TryFrom<String> for Version {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

/// Reference to a widget in an application's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetRef {
    /// Owning application.
    pub app_id: String,
    /// Widget id within the application.
    pub widget_id: String,
    /// Pinned version; `None` means latest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

impl WidgetRef {
    /// Reference the latest version of a widget.
    #[must_use]
    pub fn new(app_id: impl Into<String>, widget_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            widget_id: widget_id.into(),
            version: None,
        }
    }

    /// Pin a version.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Composite cache key: `{app_id}/{widget_id}@{version|latest}`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let version = self
            .version
            .map_or_else(|| "latest".to_string(), |v| v.to_string());
        format!("{}/{}@{version}", self.app_id, self.widget_id)
    }
}

impl fmt::Display for WidgetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cache_key())
    }
}

// ============================================================================
// Definition
// ============================================================================

/// Value type of a customization option or exposed prop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PropType {
    /// Plain string.
    String,
    /// Number.
    Number,
    /// Boolean.
    Boolean,
    /// Color (hex, rgb).
    Color,
    /// Image URL or storage path.
    ImageUrl,
    /// Icon name.
    Icon,
    /// One of a fixed set of strings.
    Enum {
        /// Allowed values.
        choices: Vec<String>,
    },
    /// Arbitrary JSON.
    Json,
}

/// Author-declared knob for customizing a widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationOption {
    /// Option id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value type.
    pub option_type: PropType,
    /// Value used when the instance does not override it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Panel group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A property of an inner component that instances may override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposedProp {
    /// Exposed prop id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Inner component the prop belongs to.
    pub target_component_id: String,
    /// Property name on the target.
    pub property_path: String,
    /// Value type.
    pub prop_type: PropType,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

/// Action a widget can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetAction {
    /// Action id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A widget as returned by the widget service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDefinition {
    /// Widget id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Root of the widget's own tree.
    pub root_component_id: String,
    /// The widget's own nodes.
    #[serde(default)]
    pub components: Vec<ComponentNode>,
    /// Customization knobs.
    #[serde(default)]
    pub customization_options: Vec<CustomizationOption>,
    /// Overridable inner props.
    #[serde(default)]
    pub exposed_props: Vec<ExposedProp>,
    /// Emitted actions.
    #[serde(default)]
    pub actions: Vec<WidgetAction>,
    /// Published version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Catalog tags.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl WidgetDefinition {
    /// Create an empty definition.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        root_component_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            root_component_id: root_component_id.into(),
            components: Vec::new(),
            customization_options: Vec::new(),
            exposed_props: Vec::new(),
            actions: Vec::new(),
            version: None,
            tags: Vec::new(),
        }
    }

    /// Add a component.
    #[must_use]
    pub fn with_component(mut self, component: ComponentNode) -> Self {
        self.components.push(component);
        self
    }

    /// The widget's root node.
    #[must_use]
    pub fn root(&self) -> Option<&ComponentNode> {
        self.components
            .iter()
            .find(|c| c.id.as_str() == self.root_component_id)
    }
}

/// A widget materialized for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSnapshot {
    /// Where the widget came from.
    pub widget_ref: WidgetRef,
    /// The definition at instantiation time.
    pub definition: WidgetDefinition,
}

/// Instance id -> materialized widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetRefStore(BTreeMap<String, WidgetSnapshot>);

impl WidgetRefStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot under `instance_id`.
    pub fn insert(&mut self, instance_id: impl Into<String>, snapshot: WidgetSnapshot) {
        self.0.insert(instance_id.into(), snapshot);
    }

    /// Add every entry of `other`, replacing entries with the same id.
    pub fn merge(&mut self, other: WidgetRefStore) {
        self.0.extend(other.0);
    }

    /// Look up an instance.
    #[must_use]
    pub fn get(&self, instance_id: &str) -> Option<&WidgetSnapshot> {
        self.0.get(instance_id)
    }

    /// Whether an instance is stored.
    #[must_use]
    pub fn contains(&self, instance_id: &str) -> bool {
        self.0.contains_key(instance_id)
    }

    /// Number of stored instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(instance_id, snapshot)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WidgetSnapshot)> {
        self.0.iter()
    }

    /// Iterate snapshots mutably.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut WidgetSnapshot> {
        self.0.values_mut()
    }

    /// Keep only instances for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|id, _| keep(id));
    }
}

// ============================================================================
// Service and cache
// ============================================================================

/// External source of widget definitions.
#[async_trait]
pub trait WidgetService: Send + Sync {
    /// Fetch a widget definition.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the widget cannot be fetched.
    async fn get_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError>;
}

/// Time source for cache expiry.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.base + offset
    }
}

/// Configuration for the widget cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetCacheConfig {
    /// Seconds an entry stays fresh.
    pub ttl_secs: u64,
}

impl WidgetCacheConfig {
    /// TTL as a duration.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for WidgetCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 } // 5 minutes
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of expired entries evicted.
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheEntry {
    definition: WidgetDefinition,
    resolved_at: Instant,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// TTL cache of widget definitions keyed by [`WidgetRef::cache_key`].
///
/// The lock is never held across an await point.
#[derive(Debug)]
pub struct WidgetCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WidgetCache {
    /// Create a cache using the system clock.
    #[must_use]
    pub fn new(config: WidgetCacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with a custom clock.
    #[must_use]
    pub fn with_clock(config: WidgetCacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl: config.ttl(),
            clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh definition for `widget`, evicting it if expired.
    #[must_use]
    pub fn get(&self, widget: &WidgetRef) -> Option<WidgetDefinition> {
        let key = widget.cache_key();
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;

        let expired = match state.entries.get(&key) {
            Some(entry) if now.saturating_duration_since(entry.resolved_at) > self.ttl => true,
            Some(entry) => {
                let definition = entry.definition.clone();
                state.stats.hits += 1;
                return Some(definition);
            }
            None => false,
        };
        if expired {
            state.entries.remove(&key);
            state.stats.evictions += 1;
        }
        state.stats.misses += 1;
        None
    }

    /// Store a definition resolved now.
    pub fn insert(&self, widget: &WidgetRef, definition: WidgetDefinition) {
        let resolved_at = self.clock.now();
        self.lock().entries.insert(
            widget.cache_key(),
            CacheEntry {
                definition,
                resolved_at,
            },
        );
    }

    /// Evict every expired entry. Returns how many were evicted.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut state = self.lock();
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.resolved_at) <= ttl);
        let evicted = before - state.entries.len();
        state.stats.evictions += evicted as u64;
        evicted
    }

    /// Number of stored entries (fresh or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}

/// Outcome of [`WidgetResolver::resolve_widgets`].
#[derive(Debug, Default)]
pub struct BatchResolution {
    /// Definitions keyed by [`WidgetRef::cache_key`].
    pub resolved: HashMap<String, WidgetDefinition>,
    /// Fetch failures keyed by [`WidgetRef::cache_key`].
    pub failed: HashMap<String, ServiceError>,
}

impl BatchResolution {
    /// Whether every widget resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cache-first widget lookup.
pub struct WidgetResolver {
    service: Arc<dyn WidgetService>,
    cache: WidgetCache,
}

impl fmt::Debug for WidgetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetResolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl WidgetResolver {
    /// Create a resolver with a fresh cache.
    #[must_use]
    pub fn new(service: Arc<dyn WidgetService>, config: WidgetCacheConfig) -> Self {
        Self::with_cache(service, WidgetCache::new(config))
    }

    /// Create a resolver around an existing cache.
    #[must_use]
    pub fn with_cache(service: Arc<dyn WidgetService>, cache: WidgetCache) -> Self {
        Self { service, cache }
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &WidgetCache {
        &self.cache
    }

    /// Return the cached definition or fetch and cache it.
    ///
    /// Concurrent misses for the same widget are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns the service error if the fetch fails; nothing is cached then.
    pub async fn resolve_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
        if let Some(definition) = self.cache.get(widget) {
            tracing::debug!(widget = %widget, "widget cache hit");
            return Ok(definition);
        }
        self.fetch(widget).await
    }

    /// Resolve many widgets, fetching all misses concurrently.
    ///
    /// A failed fetch does not discard the others: successes land in
    /// [`BatchResolution::resolved`] (and in the cache), failures in
    /// [`BatchResolution::failed`].
    pub async fn resolve_widgets(&self, widgets: &[WidgetRef]) -> BatchResolution {
        let mut batch = BatchResolution::default();
        let mut misses: Vec<&WidgetRef> = Vec::new();
        for widget in widgets {
            let key = widget.cache_key();
            if batch.resolved.contains_key(&key) || misses.iter().any(|m| m.cache_key() == key) {
                continue;
            }
            match self.cache.get(widget) {
                Some(definition) => {
                    batch.resolved.insert(key, definition);
                }
                None => misses.push(widget),
            }
        }

        tracing::debug!(
            hits = batch.resolved.len(),
            misses = misses.len(),
            "resolving widget batch"
        );
        let results = join_all(misses.iter().map(|widget| self.fetch(widget))).await;

        for (widget, result) in misses.into_iter().zip(results) {
            match result {
                Ok(definition) => {
                    batch.resolved.insert(widget.cache_key(), definition);
                }
                Err(e) => {
                    batch.failed.insert(widget.cache_key(), e);
                }
            }
        }
        batch
    }

    async fn fetch(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
        tracing::info!(widget = %widget, "fetching widget");
        match self.service.get_widget(widget).await {
            Ok(definition) => {
                self.cache.insert(widget, definition.clone());
                Ok(definition)
            }
            Err(e) => {
                tracing::warn!(widget = %widget, error = %e, "widget fetch failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WidgetService for CountingService {
        async fn get_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if widget.widget_id == "missing" {
                return Err(ServiceError::NotFound(widget.cache_key()));
            }
            Ok(WidgetDefinition::new(&widget.widget_id, "Widget", "w-root"))
        }
    }

    fn resolver(ttl_secs: u64) -> (Arc<CountingService>, Arc<ManualClock>, WidgetResolver) {
        let service = Arc::new(CountingService::default());
        let clock = Arc::new(ManualClock::new());
        let cache = WidgetCache::with_clock(WidgetCacheConfig { ttl_secs }, clock.clone());
        let resolver = WidgetResolver::with_cache(service.clone(), cache);
        (service, clock, resolver)
    }

    #[test]
    fn test_version_parse_and_display() {
        let v: Version = "1.2.3".parse().expect("should parse");
        assert_eq!(v, Version::new(1, 2, 3));
        assert_eq!(v.to_string(), "1.2.3");
        assert!("1.2".parse::<Version>().is_err());
        assert!("1.x.3".parse::<Version>().is_err());

        let json = serde_json::to_string(&v).expect("should serialize");
        assert_eq!(json, "\"1.2.3\"");
    }

    #[test]
    fn test_cache_key() {
        let latest = WidgetRef::new("app", "hero");
        assert_eq!(latest.cache_key(), "app/hero@latest");
        let pinned = latest.with_version(Version::new(2, 0, 1));
        assert_eq!(pinned.cache_key(), "app/hero@2.0.1");
    }

    #[test]
    fn test_widget_ref_wire_shape() {
        let json = serde_json::json!({"appId": "a", "widgetId": "w", "version": "1.0.0"});
        let widget: WidgetRef = serde_json::from_value(json).expect("should parse");
        assert_eq!(widget.version, Some(Version::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_resolve_caches_until_ttl() {
        let (service, clock, resolver) = resolver(300);
        let widget = WidgetRef::new("app", "hero");

        resolver.resolve_widget(&widget).await.expect("should fetch");
        clock.advance(Duration::from_secs(299));
        resolver.resolve_widget(&widget).await.expect("should hit");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_secs(2));
        resolver.resolve_widget(&widget).await.expect("should refetch");
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);

        let stats = resolver.cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let (service, _clock, resolver) = resolver(300);
        let widget = WidgetRef::new("app", "missing");
        let err = resolver.resolve_widget(&widget).await.expect_err("should fail");
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(resolver.cache().is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_widgets_merges_hits_and_misses() {
        let (service, _clock, resolver) = resolver(300);
        let a = WidgetRef::new("app", "a");
        let b = WidgetRef::new("app", "b");
        resolver.resolve_widget(&a).await.expect("should fetch");

        let batch = resolver
            .resolve_widgets(&[a.clone(), b.clone(), b.clone()])
            .await;
        assert!(batch.is_complete());
        let all = batch.resolved;
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("app/a@latest"));
        assert!(all.contains_key("app/b@latest"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_widgets_reports_failure_but_caches_successes() {
        let (_service, _clock, resolver) = resolver(300);
        let ok = WidgetRef::new("app", "ok");
        let bad = WidgetRef::new("app", "missing");
        let batch = resolver.resolve_widgets(&[ok.clone(), bad.clone()]).await;
        assert!(!batch.is_complete());
        assert!(batch.resolved.contains_key(&ok.cache_key()));
        assert!(matches!(
            batch.failed.get(&bad.cache_key()),
            Some(ServiceError::NotFound(_))
        ));
        assert!(resolver.cache().get(&ok).is_some());
    }

    #[test]
    fn test_purge_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache = WidgetCache::with_clock(WidgetCacheConfig { ttl_secs: 10 }, clock.clone());
        cache.insert(&WidgetRef::new("app", "a"), WidgetDefinition::new("a", "A", "r"));
        clock.advance(Duration::from_secs(11));
        cache.insert(&WidgetRef::new("app", "b"), WidgetDefinition::new("b", "B", "r"));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_store_serializes_as_map() {
        let mut store = WidgetRefStore::new();
        store.insert(
            "inst-1",
            WidgetSnapshot {
                widget_ref: WidgetRef::new("app", "hero"),
                definition: WidgetDefinition::new("hero", "Hero", "hero-root"),
            },
        );
        let json = serde_json::to_value(&store).expect("should serialize");
        assert_eq!(json["inst-1"]["widgetRef"]["widgetId"], "hero");
        assert_eq!(json["inst-1"]["definition"]["rootComponentId"], "hero-root");
    }
}
