//! Storage path detection and URL resolution for render preparation.
//!
//! URL-typed props (and the canvas background image) may hold a path relative
//! to the application's storage bucket. Before rendering, those paths are
//! exchanged for signed URLs through an [`AssetResolver`]. Absolute URLs and
//! inline data are left untouched.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::node::ComponentNode;
use crate::surface::SurfaceExport;
use crate::value::{BoundValue, PropValue};

/// Outcome of resolving one storage path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAsset {
    /// The storage-relative path that was requested.
    pub path: String,
    /// Signed URL, when resolution succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Error message, when resolution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// External presigning service.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    /// Resolve storage paths of `app_id` to URLs.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] if the whole request fails. Per-path
    /// failures are reported through [`ResolvedAsset::error`].
    async fn resolve(&self, app_id: &str, paths: &[String]) -> Result<Vec<ResolvedAsset>, ServiceError>;
}

const EXTERNAL_PREFIXES: [&str; 8] = [
    "http:", "https:", "blob:", "data:", "//", "#", "mailto:", "tel:",
];

/// Whether `value` is a storage-relative path.
#[must_use]
pub fn is_storage_path(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_ascii_lowercase();
    !EXTERNAL_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

fn url_literals(node: &ComponentNode) -> impl Iterator<Item = (&'static str, &str)> + '_ {
    node.kind
        .known()
        .into_iter()
        .flat_map(|kind| kind.schema().url_props())
        .filter_map(move |name| {
            node.props
                .get(name)
                .and_then(PropValue::as_literal_str)
                .map(|value| (name, value))
        })
}

/// Storage paths in the URL-typed literal props of `nodes`, deduplicated.
#[must_use]
pub fn storage_paths<'a>(nodes: impl IntoIterator<Item = &'a ComponentNode>) -> Vec<String> {
    let mut paths = BTreeSet::new();
    for node in nodes {
        for (_, value) in url_literals(node) {
            if is_storage_path(value) {
                paths.insert(value.trim().to_string());
            }
        }
    }
    paths.into_iter().collect()
}

/// Replace storage paths in `nodes` using `urls` (path -> URL).
///
/// Returns how many props were rewritten.
pub fn apply_resolved(nodes: &mut [ComponentNode], urls: &HashMap<String, String>) -> usize {
    let mut rewritten = 0;
    for node in nodes {
        let targets: Vec<(&'static str, String)> = url_literals(node)
            .filter_map(|(name, value)| urls.get(value.trim()).map(|url| (name, url.clone())))
            .collect();
        for (name, url) in targets {
            node.props
                .insert(name.to_string(), PropValue::Bound(BoundValue::string(url)));
            rewritten += 1;
        }
    }
    rewritten
}

/// Produce a render-ready copy of `nodes`.
///
/// Failed entries keep their original path and are logged.
///
/// # Errors
///
/// Returns the resolver error if the request as a whole fails.
pub async fn prepare_for_render(
    nodes: &[ComponentNode],
    resolver: &dyn AssetResolver,
    app_id: &str,
) -> Result<Vec<ComponentNode>, ServiceError> {
    let mut prepared = nodes.to_vec();
    let paths = storage_paths(prepared.iter());
    if paths.is_empty() {
        return Ok(prepared);
    }
    let urls = resolve_paths(resolver, app_id, &paths).await?;
    apply_resolved(&mut prepared, &urls);
    Ok(prepared)
}

/// Resolve storage paths throughout an export: components, widget snapshot
/// components and the canvas background image.
///
/// Returns how many values were rewritten.
///
/// # Errors
///
/// Returns the resolver error if the request as a whole fails.
pub async fn prepare_surface(
    surface: &mut SurfaceExport,
    resolver: &dyn AssetResolver,
    app_id: &str,
) -> Result<usize, ServiceError> {
    let mut paths: BTreeSet<String> = storage_paths(surface.components.iter())
        .into_iter()
        .collect();
    for (_, snapshot) in surface.widget_refs.iter() {
        paths.extend(storage_paths(snapshot.definition.components.iter()));
    }
    let background = surface
        .canvas_settings
        .background_image
        .as_deref()
        .filter(|image| is_storage_path(image))
        .map(|image| image.trim().to_string());
    if let Some(image) = &background {
        paths.insert(image.clone());
    }
    if paths.is_empty() {
        return Ok(0);
    }

    let paths: Vec<String> = paths.into_iter().collect();
    let urls = resolve_paths(resolver, app_id, &paths).await?;

    let mut rewritten = apply_resolved(&mut surface.components, &urls);
    for snapshot in surface.widget_refs.values_mut() {
        rewritten += apply_resolved(&mut snapshot.definition.components, &urls);
    }
    if let Some(url) = background.and_then(|image| urls.get(&image)) {
        surface.canvas_settings.background_image = Some(url.clone());
        rewritten += 1;
    }
    Ok(rewritten)
}

async fn resolve_paths(
    resolver: &dyn AssetResolver,
    app_id: &str,
    paths: &[String],
) -> Result<HashMap<String, String>, ServiceError> {
    tracing::debug!(app_id, count = paths.len(), "resolving storage paths");
    let resolved = resolver.resolve(app_id, paths).await.map_err(|e| {
        tracing::warn!(app_id, error = %e, "asset resolution failed");
        e
    })?;

    let mut urls = HashMap::new();
    for asset in resolved {
        match (asset.url, asset.error) {
            (Some(url), _) => {
                urls.insert(asset.path, url);
            }
            (None, error) => {
                tracing::warn!(
                    path = %asset.path,
                    error = error.as_deref().unwrap_or("no url returned"),
                    "storage path left unresolved"
                );
            }
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ComponentKind;

    struct FakeResolver;

    #[async_trait]
    impl AssetResolver for FakeResolver {
        async fn resolve(
            &self,
            app_id: &str,
            paths: &[String],
        ) -> Result<Vec<ResolvedAsset>, ServiceError> {
            Ok(paths
                .iter()
                .map(|path| {
                    if path.contains("broken") {
                        ResolvedAsset {
                            path: path.clone(),
                            url: None,
                            error: Some("denied".to_string()),
                        }
                    } else {
                        ResolvedAsset {
                            path: path.clone(),
                            url: Some(format!("https://cdn.example/{app_id}/{path}?sig=1")),
                            error: None,
                        }
                    }
                })
                .collect())
        }
    }

    fn image(id: &str, src: &str) -> ComponentNode {
        ComponentNode::with_defaults(id, ComponentKind::Image).with_prop("src", PropValue::string(src))
    }

    #[test]
    fn test_is_storage_path() {
        assert!(is_storage_path("uploads/cat.png"));
        assert!(is_storage_path("/media/logo.svg"));
        assert!(!is_storage_path("https://example.com/cat.png"));
        assert!(!is_storage_path("HTTP://example.com/cat.png"));
        assert!(!is_storage_path("blob:abc"));
        assert!(!is_storage_path("data:image/png;base64,AAAA"));
        assert!(!is_storage_path("#"));
        assert!(!is_storage_path("  "));
    }

    #[test]
    fn test_storage_paths_only_url_props() {
        let nodes = vec![
            image("a", "uploads/a.png"),
            image("b", "https://x/b.png"),
            image("c", "uploads/a.png"),
            ComponentNode::with_defaults("t", ComponentKind::Text)
                .with_prop("content", PropValue::string("uploads/not-a-url.png")),
        ];
        assert_eq!(storage_paths(nodes.iter()), vec!["uploads/a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_prepare_for_render() {
        let nodes = vec![image("a", "uploads/a.png"), image("b", "uploads/broken.png")];
        let prepared = prepare_for_render(&nodes, &FakeResolver, "app")
            .await
            .expect("should prepare");
        assert_eq!(
            prepared[0].props.get("src"),
            Some(&PropValue::string("https://cdn.example/app/uploads/a.png?sig=1"))
        );
        assert_eq!(prepared[1].props.get("src"), Some(&PropValue::string("uploads/broken.png")));
        assert_eq!(nodes[0].props.get("src"), Some(&PropValue::string("uploads/a.png")));
    }

    #[tokio::test]
    async fn test_prepare_surface_background() {
        let mut surface = SurfaceExport {
            components: vec![image("a", "https://x/a.png")],
            widget_refs: crate::widget::WidgetRefStore::new(),
            canvas_settings: crate::surface::CanvasSettings {
                background_image: Some("bg/page.jpg".to_string()),
                ..Default::default()
            },
        };
        let rewritten = prepare_surface(&mut surface, &FakeResolver, "app")
            .await
            .expect("should prepare");
        assert_eq!(rewritten, 1);
        assert_eq!(
            surface.canvas_settings.background_image.as_deref(),
            Some("https://cdn.example/app/bg/page.jpg?sig=1")
        );
    }
}
