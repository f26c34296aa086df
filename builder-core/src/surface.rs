//! Canonical serialized representation of a surface.
//!
//! ```json
//! {
//!   "components": [
//!     { "id": "root", "kind": "column", "props": { "children": { "explicitList": ["title"] } } },
//!     { "id": "title", "kind": "text", "props": { "content": { "literalString": "Hi" } } }
//!   ],
//!   "widgetRefs": {},
//!   "canvasSettings": { "backgroundColor": "#ffffff", "padding": "0px" }
//! }
//! ```
//!
//! The root is written first. On import the root is the first component that
//! no other component references, falling back to the first component.
//!
//! Raw text may also use the A2UI element form, where the kind and props live
//! in a nested `component` object: `{"id": "t", "component": {"type": "Text",
//! "content": {"literalString": "Hi"}}}`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::{BuilderError, BuilderResult};
use crate::node::{ComponentNode, NodeId};
use crate::schema::{ChildShape, ComponentKind};
use crate::widget::WidgetRefStore;

/// Page-level presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasSettings {
    /// Page background color.
    pub background_color: String,
    /// Page background image (URL or storage path).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    /// Page padding.
    pub padding: String,
    /// Extra CSS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            background_image: None,
            padding: "0px".to_string(),
            custom_css: None,
        }
    }
}

/// Serialized surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceExport {
    /// Nodes, root first.
    pub components: Vec<ComponentNode>,
    /// Materialized widgets by instance id.
    #[serde(default)]
    pub widget_refs: WidgetRefStore,
    /// Page settings.
    #[serde(default)]
    pub canvas_settings: CanvasSettings,
}

impl SurfaceExport {
    /// Build the export shape from live state.
    ///
    /// Only widget snapshots still referenced by a node are written.
    #[must_use]
    pub fn from_parts(
        document: &Document,
        widget_refs: &WidgetRefStore,
        canvas_settings: &CanvasSettings,
    ) -> Self {
        let root_id = document.root_id();
        let mut components: Vec<ComponentNode> = document.root().cloned().into_iter().collect();
        components.extend(document.nodes().filter(|n| &n.id != root_id).cloned());

        let live: HashSet<&str> = components
            .iter()
            .filter_map(ComponentNode::widget_instance_id)
            .collect();
        let mut widget_refs = widget_refs.clone();
        widget_refs.retain(|instance_id| live.contains(instance_id));

        Self {
            components,
            widget_refs,
            canvas_settings: canvas_settings.clone(),
        }
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> BuilderResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse the canonical form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the export shape.
    pub fn from_json(json: &str) -> BuilderResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Root id by the import rule.
    #[must_use]
    pub fn root_id(&self) -> Option<NodeId> {
        let referenced: HashSet<&str> = self
            .components
            .iter()
            .flat_map(ComponentNode::child_ids)
            .collect();
        self.components
            .iter()
            .find(|c| !referenced.contains(c.id.as_str()))
            .or_else(|| self.components.first())
            .map(|c| c.id.clone())
    }

    /// Validate and build a document.
    ///
    /// An empty component list yields a document with the default root.
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::Import`] on duplicate ids or cyclic references.
    pub fn to_document(&self) -> BuilderResult<Document> {
        let Some(root_id) = self.root_id() else {
            return Ok(Document::with_default_root());
        };

        let mut seen = HashSet::new();
        for component in &self.components {
            if !seen.insert(component.id.as_str()) {
                return Err(BuilderError::Import(format!(
                    "duplicate component id {}",
                    component.id
                )));
            }
        }

        let document = Document::from_nodes(self.components.clone(), root_id);
        if !document.is_acyclic() {
            return Err(BuilderError::Import(
                "component references form a cycle".to_string(),
            ));
        }
        Ok(document)
    }
}

/// Parse raw surface text, accepting both the canonical and the A2UI form.
///
/// Requires a `components` array whose entries each carry a string `id` and
/// either a `kind` string or a `component` object with a `type` string.
///
/// # Errors
///
/// Returns [`BuilderError::Import`] describing the first problem found.
pub fn parse_raw(text: &str) -> BuilderResult<SurfaceExport> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BuilderError::Import(format!("invalid JSON: {e}")))?;
    let Value::Object(mut root) = value else {
        return Err(BuilderError::Import("expected a JSON object".to_string()));
    };
    let Some(Value::Array(entries)) = root.remove("components") else {
        return Err(BuilderError::Import(
            "missing components array".to_string(),
        ));
    };

    let components = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| parse_component(index, entry))
        .collect::<BuilderResult<Vec<_>>>()?;

    let widget_refs = match root.remove("widgetRefs") {
        None | Some(Value::Null) => WidgetRefStore::default(),
        Some(v) => serde_json::from_value(v)
            .map_err(|e| BuilderError::Import(format!("invalid widgetRefs: {e}")))?,
    };
    let canvas_settings = match root.remove("canvasSettings") {
        None | Some(Value::Null) => CanvasSettings::default(),
        Some(v) => serde_json::from_value(v)
            .map_err(|e| BuilderError::Import(format!("invalid canvasSettings: {e}")))?,
    };

    Ok(SurfaceExport {
        components,
        widget_refs,
        canvas_settings,
    })
}

fn parse_component(index: usize, entry: Value) -> BuilderResult<ComponentNode> {
    let Value::Object(mut entry) = entry else {
        return Err(BuilderError::Import(format!(
            "component {index} is not an object"
        )));
    };
    let Some(Value::String(id)) = entry.remove("id") else {
        return Err(BuilderError::Import(format!(
            "component {index} has no string id"
        )));
    };

    let (kind, props) = match (entry.remove("kind"), entry.remove("component")) {
        (Some(Value::String(kind)), _) => {
            let props = entry.remove("props").unwrap_or_else(|| Value::Object(Map::new()));
            (kind, props)
        }
        (_, Some(Value::Object(mut component))) => {
            let Some(Value::String(kind)) = component.remove("type") else {
                return Err(BuilderError::Import(format!(
                    "component {id} has no type"
                )));
            };
            let known = ComponentKind::parse_a2ui(&kind);
            let kind = known.map_or(kind, |parsed| parsed.as_str().to_string());
            if let Some(children) = entry.remove("children") {
                let slot = known.map(ComponentKind::child_shape);
                let (name, value) = a2ui_children(slot, children);
                component.entry(name).or_insert(value);
            }
            (kind, Value::Object(component))
        }
        _ => {
            return Err(BuilderError::Import(format!(
                "component {id} has no kind"
            )))
        }
    };

    let mut node = Map::new();
    node.insert("id".to_string(), Value::String(id.clone()));
    node.insert("kind".to_string(), Value::String(kind));
    node.insert("props".to_string(), props);
    if let Some(style) = entry.remove("style").filter(|s| !s.is_null()) {
        node.insert("style".to_string(), style);
    }
    serde_json::from_value(Value::Object(node))
        .map_err(|e| BuilderError::Import(format!("component {id}: {e}")))
}

/// Map an A2UI element-level `children` value onto the kind's child prop.
fn a2ui_children(shape: Option<ChildShape>, children: Value) -> (String, Value) {
    match shape {
        Some(ChildShape::Slot(name)) => {
            let first = children
                .get("explicitList")
                .and_then(Value::as_array)
                .and_then(|ids| ids.first())
                .cloned()
                .unwrap_or(children);
            (name.to_string(), first)
        }
        Some(ChildShape::List(name)) => (name.to_string(), children),
        Some(ChildShape::Leaf) | None => ("children".to_string(), children),
    }
}
