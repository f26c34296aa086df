//! Widget Integration Tests
//!
//! Tests widget resolution and instantiation:
//! - TTL cache hit/miss/expiry against a counting service
//! - Concurrent batch resolution
//! - Widget drag-and-drop through the session
//! - Fetch failures leave the session untouched

use async_trait::async_trait;
use builder_core::{
    BuilderError, ComponentKind, ComponentNode, DragSource, DragTransaction, DropOutcome,
    EditorSession, ManualClock, ServiceError, Version, WidgetCache, WidgetCacheConfig,
    WidgetDefinition, WidgetRef, WidgetResolver, WidgetService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory widget library that counts fetches.
#[derive(Default)]
struct CountingService {
    calls: AtomicUsize,
}

impl CountingService {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WidgetService for CountingService {
    async fn get_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if widget.widget_id == "offline" {
            return Err(ServiceError::Request("connection refused".to_string()));
        }
        let mut definition = WidgetDefinition::new(&widget.widget_id, "Hero banner", "hero-root")
            .with_component(
                ComponentNode::with_defaults("hero-root", ComponentKind::Column)
                    .with_children(["hero-title"]),
            )
            .with_component(ComponentNode::with_defaults("hero-title", ComponentKind::Text));
        definition.version = widget.version;
        Ok(definition)
    }
}

/// Resolver with a 300s TTL driven by a manual clock.
fn setup() -> (Arc<CountingService>, Arc<ManualClock>, WidgetResolver) {
    let service = Arc::new(CountingService::default());
    let clock = Arc::new(ManualClock::new());
    let cache = WidgetCache::with_clock(WidgetCacheConfig::default(), clock.clone());
    let resolver = WidgetResolver::with_cache(service.clone(), cache);
    (service, clock, resolver)
}

// ============================================================================
// Cache Tests
// ============================================================================

#[tokio::test]
async fn test_scenario_single_fetch_within_ttl_then_refetch() {
    let (service, clock, resolver) = setup();
    let hero = WidgetRef::new("app-1", "hero");

    resolver.resolve_widget(&hero).await.expect("first resolve");
    clock.advance(Duration::from_secs(120));
    resolver.resolve_widget(&hero).await.expect("second resolve");
    assert_eq!(service.calls(), 1);

    clock.advance(Duration::from_secs(181));
    resolver.resolve_widget(&hero).await.expect("third resolve");
    assert_eq!(service.calls(), 2);

    let stats = resolver.cache().stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.evictions, 1);
}

#[tokio::test]
async fn test_versions_are_cached_separately() {
    let (service, _clock, resolver) = setup();
    let latest = WidgetRef::new("app-1", "hero");
    let pinned = latest.clone().with_version(Version::new(1, 4, 0));

    let a = resolver.resolve_widget(&latest).await.expect("latest");
    let b = resolver.resolve_widget(&pinned).await.expect("pinned");
    assert_eq!(service.calls(), 2);
    assert_eq!(a.version, None);
    assert_eq!(b.version, Some(Version::new(1, 4, 0)));
}

#[tokio::test]
async fn test_batch_fetches_only_misses() {
    let (service, _clock, resolver) = setup();
    let hero = WidgetRef::new("app-1", "hero");
    let footer = WidgetRef::new("app-1", "footer");
    resolver.resolve_widget(&hero).await.expect("warm cache");

    let batch = resolver
        .resolve_widgets(&[hero.clone(), footer.clone(), footer.clone()])
        .await;
    assert!(batch.is_complete());
    let resolved = batch.resolved;
    assert_eq!(resolved.len(), 2);
    assert!(resolved.contains_key(&hero.cache_key()));
    assert!(resolved.contains_key(&footer.cache_key()));
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_batch_failure_keeps_successful_results() {
    let (service, _clock, resolver) = setup();
    let hero = WidgetRef::new("app-1", "hero");
    let offline = WidgetRef::new("app-1", "offline");

    let batch = resolver.resolve_widgets(&[hero.clone(), offline.clone()]).await;
    assert!(matches!(
        batch.failed.get(&offline.cache_key()),
        Some(ServiceError::Request(_))
    ));
    assert_eq!(batch.failed.len(), 1);
    assert!(batch.resolved.contains_key(&hero.cache_key()));

    resolver.resolve_widget(&hero).await.expect("cached");
    assert_eq!(service.calls(), 2);
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_widget_drop_creates_leaf_instance() {
    let (_service, _clock, resolver) = setup();
    let mut session = EditorSession::default();
    let hero = WidgetRef::new("app-1", "hero");

    let mut drag = DragTransaction::start(&session, DragSource::Widget(hero.clone()));
    assert!(drag.over(&session, "root", None));
    let outcome = drag
        .finish_with(&mut session, &resolver)
        .await
        .expect("should drop");
    let DropOutcome::Instantiated(id) = outcome else {
        panic!("expected an instance");
    };

    let node = session.document().get(id.as_str()).expect("instance node");
    assert!(node.is_widget_instance());
    assert!(node.child_ids().is_empty());
    assert!(!session.document().contains("hero-root"));

    let outline = session.document().outline();
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[1].id, id);

    let export = session.export();
    assert_eq!(export.widget_refs.len(), 1);
    let instance = node.widget_instance_id().expect("instance id");
    let snapshot = export.widget_refs.get(instance).expect("snapshot");
    assert_eq!(snapshot.widget_ref, hero);
    assert_eq!(snapshot.definition.components.len(), 2);
}

#[tokio::test]
async fn test_offline_widget_drop_changes_nothing() {
    let (service, _clock, resolver) = setup();
    let mut session = EditorSession::default();
    let before = session.document().clone();

    let mut drag =
        DragTransaction::start(&session, DragSource::Widget(WidgetRef::new("app-1", "offline")));
    drag.over(&session, "root", Some(0));
    let err = drag
        .finish_with(&mut session, &resolver)
        .await
        .expect_err("fetch should fail");

    assert!(matches!(err, BuilderError::Service(ServiceError::Request(_))));
    assert_eq!(service.calls(), 1);
    assert_eq!(session.document(), &before);
    assert!(session.widget_refs().is_empty());
    assert!(!session.can_undo());
}

#[tokio::test]
async fn test_deleted_instance_drops_out_of_export_but_undo_restores() {
    let (_service, _clock, resolver) = setup();
    let mut session = EditorSession::default();
    let hero = WidgetRef::new("app-1", "hero");
    let definition = resolver.resolve_widget(&hero).await.expect("resolve");
    let id = session
        .instantiate_widget("root", None, hero, definition)
        .expect("instantiate");

    session.select([id]);
    session.delete_selected();
    assert!(session.export().widget_refs.is_empty());

    assert!(session.undo());
    assert_eq!(session.export().widget_refs.len(), 1);
}
