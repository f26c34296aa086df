//! Schema validation and normalization of externally produced nodes.
//!
//! Anything that enters the document from outside the editor (generated trees,
//! raw imports, pasted JSON) passes through here first.
//!
//! | Input                          | Single node           | Batch             |
//! |--------------------------------|-----------------------|-------------------|
//! | Unknown kind                   | kept unchanged, warn  | dropped, warn     |
//! | Unregistered prop (strict)     | dropped, warn         | dropped, warn     |
//! | Unregistered prop (non-strict) | kept                  | kept              |
//! | Wrong shape, coercible         | coerced               | coerced           |
//! | Wrong shape or enum value      | default / dropped     | default / dropped |
//! | Absent registered prop         | default filled        | default filled    |
//!
//! Normalization is idempotent.

use serde_json::Value;

use crate::defaults::default_props;
use crate::node::{ComponentNode, NodeId};
use crate::schema::{ComponentKind, PropSpec, ValueKind};
use crate::value::{BoundValue, ChildList, PropValue, Props, SelectOption};

/// Result of normalizing a batch.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    /// Normalized nodes, input order preserved.
    pub nodes: Vec<ComponentNode>,
    /// Ids dropped because their kind is unknown.
    pub dropped: Vec<NodeId>,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

/// Normalize one node.
///
/// Unknown kinds are returned unchanged (with a warning) so a single foreign
/// node can still be inspected.
#[must_use]
pub fn normalize_component(node: ComponentNode, strict: bool) -> ComponentNode {
    let mut normalizer = Normalizer::new(strict);
    match node.kind.known() {
        Some(kind) => normalizer.normalize_known(node, kind),
        None => {
            normalizer.warn(format!(
                "{}: unknown kind {} passed through",
                node.id, node.kind
            ));
            node
        }
    }
}

/// Normalize a batch, dropping nodes of unknown kind.
#[must_use]
pub fn normalize_components(nodes: Vec<ComponentNode>, strict: bool) -> Vec<ComponentNode> {
    normalize_report(nodes, strict).nodes
}

/// Normalize a batch and report what changed.
#[must_use]
pub fn normalize_report(nodes: Vec<ComponentNode>, strict: bool) -> NormalizeReport {
    let mut normalizer = Normalizer::new(strict);
    let mut report = NormalizeReport::default();
    for node in nodes {
        match node.kind.known() {
            Some(kind) => report.nodes.push(normalizer.normalize_known(node, kind)),
            None => {
                normalizer.warn(format!("{}: unknown kind {} dropped", node.id, node.kind));
                report.dropped.push(node.id);
            }
        }
    }
    report.warnings = normalizer.warnings;
    report
}

/// Internal normalizer state.
struct Normalizer {
    /// Drop unregistered props.
    strict: bool,
    /// Accumulated warnings.
    warnings: Vec<String>,
}

impl Normalizer {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    fn normalize_known(&mut self, node: ComponentNode, kind: ComponentKind) -> ComponentNode {
        let schema = kind.schema();
        let mut defaults = default_props(kind);
        let mut props = Props::new();

        for (name, value) in node.props {
            let Some(spec) = schema.prop(&name) else {
                if self.strict {
                    self.warn(format!("{}: unregistered prop {name} dropped", node.id));
                } else {
                    props.insert(name, value);
                }
                continue;
            };

            if let Some(valid) = coerce(spec, value) {
                props.insert(name, valid);
            } else if let Some(default) = defaults.remove(&name) {
                self.warn(format!("{}: invalid {name} replaced by default", node.id));
                props.insert(name, default);
            } else {
                self.warn(format!("{}: invalid {name} dropped", node.id));
            }
        }

        for (name, default) in defaults {
            props.entry(name).or_insert(default);
        }

        ComponentNode {
            id: node.id,
            kind: node.kind,
            props,
            style: node.style,
        }
    }
}

/// Bring `value` into the shape `spec` expects, or give up.
fn coerce(spec: &PropSpec, value: PropValue) -> Option<PropValue> {
    if spec.accepts(&value) {
        return Some(value);
    }
    let coerced = match (spec.value_kind, value) {
        (ValueKind::String | ValueKind::Url | ValueKind::Json, PropValue::Ref(s)) => {
            PropValue::string(s)
        }
        (ValueKind::String | ValueKind::Url, PropValue::Raw(Value::Number(n))) => {
            PropValue::string(n.to_string())
        }
        (ValueKind::Number, PropValue::Raw(Value::Number(n))) => PropValue::number(n.as_f64()?),
        (ValueKind::Number, PropValue::Ref(s)) => PropValue::number(s.trim().parse().ok()?),
        (ValueKind::Bool, PropValue::Raw(Value::Bool(b))) => PropValue::bool(b),
        (ValueKind::Bool, PropValue::Ref(s)) => PropValue::bool(s.trim().parse().ok()?),
        (ValueKind::Json, PropValue::Raw(v)) => PropValue::Bound(BoundValue::json(v)),
        (ValueKind::Options, PropValue::Raw(v)) => {
            let options: Vec<SelectOption> = serde_json::from_value(v).ok()?;
            PropValue::Bound(BoundValue::options(options))
        }
        (ValueKind::ChildList, PropValue::Raw(Value::Array(items))) => {
            let ids = items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?;
            PropValue::Children(ChildList { explicit_list: ids })
        }
        (ValueKind::ChildList, PropValue::Ref(s)) => PropValue::children([s]),
        (ValueKind::ChildRef, PropValue::Bound(BoundValue::LiteralString { value })) => {
            PropValue::Ref(value)
        }
        (ValueKind::ChildRef, PropValue::Children(mut list)) if list.explicit_list.len() == 1 => {
            PropValue::Ref(list.explicit_list.remove(0))
        }
        _ => return None,
    };
    spec.accepts(&coerced).then_some(coerced)
}
