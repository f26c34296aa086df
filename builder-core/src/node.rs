//! Component nodes - the building blocks of surfaces.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults::default_props;
use crate::error::{BuilderError, BuilderResult};
use crate::schema::{ChildShape, ComponentKind};
use crate::value::{ChildList, PropValue, Props};

/// Unique identifier of a node within one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id prefixed with the kind name, e.g. `text-1a2b3c4d`.
    #[must_use]
    pub fn generate(prefix: &str) -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self(format!("{prefix}-{}", &uuid[..8]))
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of a node: a registered kind, or an unknown name kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    /// A kind from the registry.
    Known(ComponentKind),
    /// A kind the registry does not know.
    Unknown(String),
}

impl Kind {
    /// Wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(kind) => kind.as_str(),
            Self::Unknown(name) => name,
        }
    }

    /// The registered kind, if any.
    #[must_use]
    pub fn known(&self) -> Option<ComponentKind> {
        match self {
            Self::Known(kind) => Some(*kind),
            Self::Unknown(_) => None,
        }
    }
}

impl From<ComponentKind> for Kind {
    fn from(kind: ComponentKind) -> Self {
        Self::Known(kind)
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        ComponentKind::parse(&name).map_or(Self::Unknown(name), Self::Known)
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Known(kind) => kind.as_str().to_string(),
            Kind::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual overrides for a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Background color or gradient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Foreground color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Inner spacing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    /// Outer spacing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    /// Width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    /// Corner radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<String>,
    /// Utility class names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Any other style keys, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A node in the surface tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Unique id within the document.
    pub id: NodeId,
    /// Component kind.
    pub kind: Kind,
    /// Property bag, including the children reference.
    #[serde(default)]
    pub props: Props,
    /// Optional style overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
}

impl ComponentNode {
    /// Create a node with no properties.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, kind: impl Into<Kind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            props: Props::new(),
            style: None,
        }
    }

    /// Create a node populated from the default table.
    #[must_use]
    pub fn with_defaults(id: impl Into<NodeId>, kind: ComponentKind) -> Self {
        Self {
            id: id.into(),
            kind: Kind::Known(kind),
            props: default_props(kind),
            style: None,
        }
    }

    /// Set a property.
    #[must_use]
    pub fn with_prop(mut self, name: impl Into<String>, value: PropValue) -> Self {
        self.props.insert(name.into(), value);
        self
    }

    /// Set the children of a list container (or the slot of a slot container).
    ///
    /// Leaves and unknown kinds are returned unchanged.
    #[must_use]
    pub fn with_children<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_children(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Set style overrides.
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = Some(style);
        self
    }

    /// Child shape from the registry; unknown kinds are leaves.
    #[must_use]
    pub fn child_shape(&self) -> ChildShape {
        self.kind
            .known()
            .map_or(ChildShape::Leaf, ComponentKind::child_shape)
    }

    /// Whether this node can be a drop or paste target.
    #[must_use]
    pub fn supports_children(&self) -> bool {
        !matches!(self.child_shape(), ChildShape::Leaf)
    }

    /// Whether this node is a widget instance.
    #[must_use]
    pub fn is_widget_instance(&self) -> bool {
        self.kind == Kind::Known(ComponentKind::WidgetInstance)
    }

    /// Instance id carried by a widget-instance node.
    #[must_use]
    pub fn widget_instance_id(&self) -> Option<&str> {
        if !self.is_widget_instance() {
            return None;
        }
        self.props
            .get("instanceId")
            .and_then(PropValue::as_literal_str)
    }

    /// Names of properties that hold child references.
    ///
    /// Known kinds use the registry; unknown kinds treat any child list as a
    /// reference so their subtrees are still reachable.
    #[must_use]
    pub fn reference_prop_names(&self) -> Vec<&str> {
        match self.kind.known() {
            Some(kind) => kind.schema().reference_props().map(|spec| spec.name).collect(),
            None => self
                .props
                .iter()
                .filter(|(_, value)| matches!(value, PropValue::Children(_)))
                .map(|(name, _)| name.as_str())
                .collect(),
        }
    }

    /// Ids referenced as children, in order.
    #[must_use]
    pub fn child_ids(&self) -> Vec<&str> {
        if self.is_widget_instance() {
            return Vec::new();
        }
        self.reference_prop_names()
            .into_iter()
            .filter_map(|name| self.props.get(name))
            .flat_map(PropValue::referenced_ids)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Whether `child` is referenced by this node.
    #[must_use]
    pub fn references(&self, child: &str) -> bool {
        self.child_ids().contains(&child)
    }

    /// Rewrite child references through `map`.
    pub fn remap_references(&mut self, map: &HashMap<String, String>) {
        let names: Vec<String> = self
            .reference_prop_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in names {
            if let Some(value) = self.props.get_mut(&name) {
                value.remap_ids(map);
            }
        }
    }

    /// Rewrite references to `old` into references to `new`.
    pub fn replace_reference(&mut self, old: &str, new: &str) {
        let map = HashMap::from([(old.to_string(), new.to_string())]);
        self.remap_references(&map);
    }

    /// Remove a child reference.
    ///
    /// Returns the position the child had (0 for a slot), or `None` if it was
    /// not referenced.
    pub fn remove_reference(&mut self, child: &str) -> Option<usize> {
        let names: Vec<String> = self
            .reference_prop_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        for name in names {
            let Some(value) = self.props.get_mut(&name) else {
                continue;
            };
            match value {
                PropValue::Children(list) => {
                    if let Some(pos) = list.explicit_list.iter().position(|id| id == child) {
                        list.explicit_list.remove(pos);
                        return Some(pos);
                    }
                }
                PropValue::Ref(id) if id == child => {
                    self.props.remove(&name);
                    return Some(0);
                }
                _ => {}
            }
        }
        None
    }

    /// Insert a child reference at `index` (append when `None`, clamped).
    ///
    /// # Errors
    ///
    /// Returns [`BuilderError::InvalidTarget`] if this node is a leaf or its
    /// single slot is already occupied.
    pub fn insert_child(&mut self, child: &str, index: Option<usize>) -> BuilderResult<()> {
        match self.child_shape() {
            ChildShape::Leaf => Err(BuilderError::InvalidTarget(format!(
                "{} ({}) cannot have children",
                self.id, self.kind
            ))),
            ChildShape::List(name) => {
                let entry = self
                    .props
                    .entry(name.to_string())
                    .or_insert_with(|| PropValue::Children(ChildList::default()));
                if !matches!(entry, PropValue::Children(_)) {
                    *entry = PropValue::Children(ChildList::default());
                }
                if let PropValue::Children(list) = entry {
                    let at = index.map_or(list.explicit_list.len(), |i| {
                        i.min(list.explicit_list.len())
                    });
                    list.explicit_list.insert(at, child.to_string());
                }
                Ok(())
            }
            ChildShape::Slot(name) => match self.props.get(name) {
                Some(PropValue::Ref(existing)) if !existing.is_empty() && existing != child => {
                    Err(BuilderError::InvalidTarget(format!(
                        "slot {name} of {} is occupied by {existing}",
                        self.id
                    )))
                }
                _ => {
                    self.props
                        .insert(name.to_string(), PropValue::reference(child));
                    Ok(())
                }
            },
        }
    }

    /// Whether a new child can be attached right now.
    #[must_use]
    pub fn can_accept_child(&self) -> bool {
        match self.child_shape() {
            ChildShape::Leaf => false,
            ChildShape::List(_) => true,
            ChildShape::Slot(name) => !matches!(
                self.props.get(name),
                Some(PropValue::Ref(existing)) if !existing.is_empty()
            ),
        }
    }

    /// Replace all children (list containers) or the slot (slot containers).
    pub fn set_children(&mut self, ids: Vec<String>) {
        match self.child_shape() {
            ChildShape::Leaf => {}
            ChildShape::List(name) => {
                self.props.insert(
                    name.to_string(),
                    PropValue::Children(ChildList { explicit_list: ids }),
                );
            }
            ChildShape::Slot(name) => match ids.into_iter().next() {
                Some(id) => {
                    self.props.insert(name.to_string(), PropValue::Ref(id));
                }
                None => {
                    self.props.remove(name);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_id_generate() {
        let id = NodeId::generate("text");
        assert!(id.as_str().starts_with("text-"));
        assert_eq!(id.as_str().len(), "text-".len() + 8);
        assert_ne!(id, NodeId::generate("text"));
    }

    #[test]
    fn test_kind_serializes_as_string() {
        let node = ComponentNode::new("a", ComponentKind::TextField);
        let json = serde_json::to_value(&node).expect("should serialize");
        assert_eq!(json, json!({"id": "a", "kind": "textField", "props": {}}));

        let unknown: ComponentNode =
            serde_json::from_value(json!({"id": "b", "kind": "carousel"})).expect("parse");
        assert_eq!(unknown.kind, Kind::Unknown("carousel".to_string()));
    }

    #[test]
    fn test_child_ids_follow_registry() {
        let column = ComponentNode::new("col", ComponentKind::Column)
            .with_children(["a", "b"])
            .with_prop("label", PropValue::reference("c"));
        assert_eq!(column.child_ids(), vec!["a", "b"]);

        let card = ComponentNode::new("card", ComponentKind::Card).with_children(["body"]);
        assert_eq!(card.child_ids(), vec!["body"]);
    }

    #[test]
    fn test_widget_instance_is_leaf() {
        let node = ComponentNode::with_defaults("w", ComponentKind::WidgetInstance)
            .with_prop("instanceId", PropValue::string("inst-1"));
        assert!(node.child_ids().is_empty());
        assert_eq!(node.widget_instance_id(), Some("inst-1"));
    }

    #[test]
    fn test_insert_and_remove_child() {
        let mut column = ComponentNode::new("col", ComponentKind::Column).with_children(["a", "b"]);
        column.insert_child("c", Some(1)).expect("should insert");
        column.insert_child("d", Some(99)).expect("should clamp");
        assert_eq!(column.child_ids(), vec!["a", "c", "b", "d"]);
        assert_eq!(column.remove_reference("b"), Some(2));
        assert_eq!(column.remove_reference("zzz"), None);
    }

    #[test]
    fn test_slot_accepts_only_when_empty() {
        let mut card = ComponentNode::new("card", ComponentKind::Card);
        assert!(card.can_accept_child());
        card.insert_child("a", None).expect("empty slot should accept");
        assert!(!card.can_accept_child());
        let err = card.insert_child("b", None).expect_err("occupied slot should reject");
        assert!(matches!(err, BuilderError::InvalidTarget(_)));
        assert_eq!(card.remove_reference("a"), Some(0));
        assert!(card.can_accept_child());
    }

    #[test]
    fn test_leaf_rejects_children() {
        let mut text = ComponentNode::with_defaults("t", ComponentKind::Text);
        assert!(text.insert_child("x", None).is_err());
    }

    #[test]
    fn test_replace_reference_leaves_literals() {
        let mut column = ComponentNode::new("col", ComponentKind::Column)
            .with_children(["a"])
            .with_prop("gap", PropValue::string("a"));
        column.replace_reference("a", "z");
        assert_eq!(column.child_ids(), vec!["z"]);
        assert_eq!(column.props.get("gap"), Some(&PropValue::string("a")));
    }
}
