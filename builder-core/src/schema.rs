//! Schema registry: the closed set of component kinds and their properties.
//!
//! Each kind has a static [`KindSchema`] listing the properties it accepts,
//! the value shape of each, whether it is required, and the enumeration of
//! allowed literal strings where one applies. Reference-typed properties
//! (child lists and single-child slots) are declared here too; every tree walk
//! in the crate discovers children through [`KindSchema::reference_props`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{BoundValue, PropValue};

/// A component kind from the closed registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    // Layout
    /// Horizontal flex container.
    Row,
    /// Vertical flex container.
    Column,
    /// Layered container.
    Stack,
    /// Grid container.
    Grid,
    /// Scrollable single-child viewport.
    ScrollArea,

    // Containers
    /// Card with a single body slot.
    Card,
    /// Modal dialog with a content slot.
    Modal,
    /// Tooltip wrapping an entry point component.
    Tooltip,

    // Display
    /// Text block.
    Text,
    /// Image.
    Image,
    /// Icon glyph.
    Icon,
    /// Video player.
    Video,
    /// Markdown block.
    Markdown,
    /// Separator line.
    Divider,
    /// Small label badge.
    Badge,
    /// User avatar.
    Avatar,
    /// Progress bar.
    Progress,
    /// Loading spinner.
    Spinner,

    // Interactive
    /// Push button.
    Button,
    /// Text input.
    TextField,
    /// Dropdown select.
    Select,
    /// Range slider.
    Slider,
    /// Checkbox.
    Checkbox,
    /// Toggle switch.
    Switch,
    /// Hyperlink.
    Link,

    /// Instance of an externally authored widget (a leaf in the document).
    WidgetInstance,
}

impl ComponentKind {
    /// Every registered kind.
    pub const ALL: [Self; 26] = [
        Self::Row,
        Self::Column,
        Self::Stack,
        Self::Grid,
        Self::ScrollArea,
        Self::Card,
        Self::Modal,
        Self::Tooltip,
        Self::Text,
        Self::Image,
        Self::Icon,
        Self::Video,
        Self::Markdown,
        Self::Divider,
        Self::Badge,
        Self::Avatar,
        Self::Progress,
        Self::Spinner,
        Self::Button,
        Self::TextField,
        Self::Select,
        Self::Slider,
        Self::Checkbox,
        Self::Switch,
        Self::Link,
        Self::WidgetInstance,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Column => "column",
            Self::Stack => "stack",
            Self::Grid => "grid",
            Self::ScrollArea => "scrollArea",
            Self::Card => "card",
            Self::Modal => "modal",
            Self::Tooltip => "tooltip",
            Self::Text => "text",
            Self::Image => "image",
            Self::Icon => "icon",
            Self::Video => "video",
            Self::Markdown => "markdown",
            Self::Divider => "divider",
            Self::Badge => "badge",
            Self::Avatar => "avatar",
            Self::Progress => "progress",
            Self::Spinner => "spinner",
            Self::Button => "button",
            Self::TextField => "textField",
            Self::Select => "select",
            Self::Slider => "slider",
            Self::Checkbox => "checkbox",
            Self::Switch => "switch",
            Self::Link => "link",
            Self::WidgetInstance => "widgetInstance",
        }
    }

    /// Look up a kind by its exact wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }

    /// Look up an A2UI `type` name such as `"Column"` or `"TextField"`.
    ///
    /// Exact first, then case-insensitive.
    #[must_use]
    pub fn parse_a2ui(name: &str) -> Option<Self> {
        Self::parse(name).or_else(|| {
            Self::ALL
                .iter()
                .copied()
                .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
        })
    }

    /// Static schema for this kind.
    #[must_use]
    pub fn schema(self) -> &'static KindSchema {
        schema_for(self)
    }

    /// Child shape for this kind.
    #[must_use]
    pub fn child_shape(self) -> ChildShape {
        self.schema().child_shape()
    }

    /// Whether nodes of this kind can hold children.
    #[must_use]
    pub fn supports_children(self) -> bool {
        !matches!(self.child_shape(), ChildShape::Leaf)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value shape accepted by a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Literal string or binding.
    String,
    /// Literal number or binding.
    Number,
    /// Literal boolean or binding.
    Bool,
    /// Any bound value.
    Json,
    /// Options list or binding.
    Options,
    /// URL or storage-relative path (string literal or binding).
    Url,
    /// Ordered list of child ids.
    ChildList,
    /// Single child id.
    ChildRef,
}

impl ValueKind {
    /// Whether `value` has the shape this kind expects.
    #[must_use]
    pub fn accepts(self, value: &PropValue) -> bool {
        let PropValue::Bound(bound) = value else {
            return match self {
                Self::ChildList => matches!(value, PropValue::Children(_)),
                Self::ChildRef => matches!(value, PropValue::Ref(_)),
                _ => false,
            };
        };
        match self {
            Self::ChildList | Self::ChildRef => false,
            Self::Json => true,
            Self::String | Self::Url => matches!(
                bound,
                BoundValue::Path(_) | BoundValue::LiteralString { .. }
            ),
            Self::Number => matches!(
                bound,
                BoundValue::Path(_) | BoundValue::LiteralNumber { .. }
            ),
            Self::Bool => matches!(bound, BoundValue::Path(_) | BoundValue::LiteralBool { .. }),
            Self::Options => matches!(
                bound,
                BoundValue::Path(_) | BoundValue::LiteralOptions { .. }
            ),
        }
    }

    /// Whether this is a reference-typed shape.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(self, Self::ChildList | Self::ChildRef)
    }
}

/// Declaration of a single property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropSpec {
    /// Property name as it appears on the wire.
    pub name: &'static str,
    /// Accepted value shape.
    pub value_kind: ValueKind,
    /// Whether normalization must guarantee a value.
    pub required: bool,
    /// Allowed literal strings; empty means unrestricted.
    pub allowed: &'static [&'static str],
}

impl PropSpec {
    /// Whether `value` satisfies shape and enumeration.
    #[must_use]
    pub fn accepts(&self, value: &PropValue) -> bool {
        if !self.value_kind.accepts(value) {
            return false;
        }
        if self.allowed.is_empty() {
            return true;
        }
        match value.as_literal_str() {
            Some(literal) => self.allowed.contains(&literal),
            None => true,
        }
    }
}

const fn prop(name: &'static str, value_kind: ValueKind) -> PropSpec {
    PropSpec {
        name,
        value_kind,
        required: false,
        allowed: &[],
    }
}

const fn required(name: &'static str, value_kind: ValueKind) -> PropSpec {
    PropSpec {
        name,
        value_kind,
        required: true,
        allowed: &[],
    }
}

const fn choice(name: &'static str, allowed: &'static [&'static str]) -> PropSpec {
    PropSpec {
        name,
        value_kind: ValueKind::String,
        required: false,
        allowed,
    }
}

/// Where a kind keeps its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildShape {
    /// No children.
    Leaf,
    /// Ordered list under the named property.
    List(&'static str),
    /// One child id under the named property.
    Slot(&'static str),
}

impl ChildShape {
    /// Name of the property holding children, if any.
    #[must_use]
    pub const fn prop_name(self) -> Option<&'static str> {
        match self {
            Self::Leaf => None,
            Self::List(name) | Self::Slot(name) => Some(name),
        }
    }
}

/// Static description of one kind.
#[derive(Debug)]
pub struct KindSchema {
    /// The kind described.
    pub kind: ComponentKind,
    /// Declared properties.
    pub props: &'static [PropSpec],
}

impl KindSchema {
    /// Declaration of a property by name.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&'static PropSpec> {
        self.props.iter().find(|spec| spec.name == name)
    }

    /// Reference-typed property declarations.
    pub fn reference_props(&self) -> impl Iterator<Item = &'static PropSpec> {
        self.props
            .iter()
            .filter(|spec| spec.value_kind.is_reference())
    }

    /// Child shape derived from the reference-typed declarations.
    #[must_use]
    pub fn child_shape(&self) -> ChildShape {
        match self.reference_props().next() {
            Some(spec) if spec.value_kind == ValueKind::ChildList => ChildShape::List(spec.name),
            Some(spec) => ChildShape::Slot(spec.name),
            None => ChildShape::Leaf,
        }
    }

    /// Names of URL-typed properties.
    pub fn url_props(&self) -> impl Iterator<Item = &'static str> {
        self.props
            .iter()
            .filter(|spec| spec.value_kind == ValueKind::Url)
            .map(|spec| spec.name)
    }
}

// ============================================================================
// Tables
// ============================================================================

use ValueKind::{Bool, ChildList, ChildRef, Json, Number, Options, Url};

const ALIGN: &[&str] = &["start", "center", "end", "stretch", "baseline"];
const JUSTIFY: &[&str] = &["start", "center", "end", "between", "around", "evenly"];
const SIZE: &[&str] = &["xs", "sm", "md", "lg", "xl"];
const TEXT_ALIGN: &[&str] = &["left", "center", "right", "justify"];

static ROW: KindSchema = KindSchema {
    kind: ComponentKind::Row,
    props: &[
        prop("children", ChildList),
        prop("gap", ValueKind::String),
        choice("align", ALIGN),
        choice("justify", JUSTIFY),
        prop("wrap", Bool),
        prop("reverse", Bool),
    ],
};

static COLUMN: KindSchema = KindSchema {
    kind: ComponentKind::Column,
    props: &[
        prop("children", ChildList),
        prop("gap", ValueKind::String),
        choice("align", ALIGN),
        choice("justify", JUSTIFY),
        prop("wrap", Bool),
        prop("reverse", Bool),
    ],
};

static STACK: KindSchema = KindSchema {
    kind: ComponentKind::Stack,
    props: &[prop("children", ChildList), choice("align", ALIGN)],
};

static GRID: KindSchema = KindSchema {
    kind: ComponentKind::Grid,
    props: &[
        prop("children", ChildList),
        prop("columns", Number),
        prop("rows", Number),
        prop("gap", ValueKind::String),
        choice("autoFlow", &["row", "column", "dense"]),
    ],
};

static SCROLL_AREA: KindSchema = KindSchema {
    kind: ComponentKind::ScrollArea,
    props: &[
        prop("child", ChildRef),
        choice("direction", &["vertical", "horizontal", "both"]),
    ],
};

static CARD: KindSchema = KindSchema {
    kind: ComponentKind::Card,
    props: &[
        prop("child", ChildRef),
        prop("title", ValueKind::String),
        prop("description", ValueKind::String),
        choice("variant", &["default", "outline", "elevated"]),
        prop("hoverable", Bool),
        prop("headerImage", Url),
    ],
};

static MODAL: KindSchema = KindSchema {
    kind: ComponentKind::Modal,
    props: &[
        prop("content", ChildRef),
        required("open", Bool),
        prop("title", ValueKind::String),
        prop("closeOnOverlay", Bool),
        choice("size", &["sm", "md", "lg", "xl", "full"]),
    ],
};

static TOOLTIP: KindSchema = KindSchema {
    kind: ComponentKind::Tooltip,
    props: &[
        prop("entryPointChild", ChildRef),
        required("content", ValueKind::String),
        choice("side", &["top", "right", "bottom", "left"]),
        prop("delayMs", Number),
    ],
};

static TEXT: KindSchema = KindSchema {
    kind: ComponentKind::Text,
    props: &[
        required("content", ValueKind::String),
        choice(
            "variant",
            &["body", "caption", "code", "h1", "h2", "h3", "h4", "label"],
        ),
        choice("size", SIZE),
        choice("weight", &["light", "normal", "medium", "semibold", "bold"]),
        prop("color", ValueKind::String),
        choice("align", TEXT_ALIGN),
        prop("maxLines", Number),
    ],
};

static IMAGE: KindSchema = KindSchema {
    kind: ComponentKind::Image,
    props: &[
        required("src", Url),
        prop("alt", ValueKind::String),
        choice("fit", &["contain", "cover", "fill", "none", "scale-down"]),
        prop("fallback", Url),
    ],
};

static ICON: KindSchema = KindSchema {
    kind: ComponentKind::Icon,
    props: &[
        required("name", ValueKind::String),
        choice("size", SIZE),
        prop("color", ValueKind::String),
    ],
};

static VIDEO: KindSchema = KindSchema {
    kind: ComponentKind::Video,
    props: &[
        required("src", Url),
        prop("poster", Url),
        prop("autoplay", Bool),
        prop("loop", Bool),
        prop("muted", Bool),
        prop("controls", Bool),
    ],
};

static MARKDOWN: KindSchema = KindSchema {
    kind: ComponentKind::Markdown,
    props: &[
        required("content", ValueKind::String),
        prop("allowHtml", Bool),
    ],
};

static DIVIDER: KindSchema = KindSchema {
    kind: ComponentKind::Divider,
    props: &[
        choice("orientation", &["horizontal", "vertical"]),
        prop("thickness", Number),
        prop("color", ValueKind::String),
    ],
};

static BADGE: KindSchema = KindSchema {
    kind: ComponentKind::Badge,
    props: &[
        required("content", ValueKind::String),
        choice(
            "variant",
            &["default", "secondary", "outline", "destructive"],
        ),
    ],
};

static AVATAR: KindSchema = KindSchema {
    kind: ComponentKind::Avatar,
    props: &[
        prop("src", Url),
        prop("fallback", ValueKind::String),
        choice("size", SIZE),
    ],
};

static PROGRESS: KindSchema = KindSchema {
    kind: ComponentKind::Progress,
    props: &[
        required("value", Number),
        prop("max", Number),
        prop("showLabel", Bool),
    ],
};

static SPINNER: KindSchema = KindSchema {
    kind: ComponentKind::Spinner,
    props: &[choice("size", SIZE), prop("color", ValueKind::String)],
};

static BUTTON: KindSchema = KindSchema {
    kind: ComponentKind::Button,
    props: &[
        required("label", ValueKind::String),
        choice(
            "variant",
            &["default", "secondary", "outline", "ghost", "link", "destructive"],
        ),
        choice("size", SIZE),
        prop("disabled", Bool),
        prop("icon", ValueKind::String),
        prop("action", Json),
    ],
};

static TEXT_FIELD: KindSchema = KindSchema {
    kind: ComponentKind::TextField,
    props: &[
        required("value", ValueKind::String),
        prop("placeholder", ValueKind::String),
        prop("label", ValueKind::String),
        choice(
            "inputType",
            &["text", "email", "password", "number", "tel", "url"],
        ),
        prop("multiline", Bool),
        prop("disabled", Bool),
    ],
};

static SELECT: KindSchema = KindSchema {
    kind: ComponentKind::Select,
    props: &[
        required("value", ValueKind::String),
        required("options", Options),
        prop("placeholder", ValueKind::String),
        prop("label", ValueKind::String),
        prop("multiple", Bool),
        prop("disabled", Bool),
    ],
};

static SLIDER: KindSchema = KindSchema {
    kind: ComponentKind::Slider,
    props: &[
        required("value", Number),
        prop("min", Number),
        prop("max", Number),
        prop("step", Number),
        prop("label", ValueKind::String),
    ],
};

static CHECKBOX: KindSchema = KindSchema {
    kind: ComponentKind::Checkbox,
    props: &[
        required("checked", Bool),
        prop("label", ValueKind::String),
        prop("disabled", Bool),
    ],
};

static SWITCH: KindSchema = KindSchema {
    kind: ComponentKind::Switch,
    props: &[
        required("checked", Bool),
        prop("label", ValueKind::String),
        prop("disabled", Bool),
    ],
};

static LINK: KindSchema = KindSchema {
    kind: ComponentKind::Link,
    props: &[
        required("href", Url),
        prop("label", ValueKind::String),
        choice("target", &["_self", "_blank"]),
        prop("disabled", Bool),
    ],
};

static WIDGET_INSTANCE: KindSchema = KindSchema {
    kind: ComponentKind::WidgetInstance,
    props: &[
        required("instanceId", ValueKind::String),
        prop("overrides", Json),
    ],
};

/// Static schema for `kind`.
#[must_use]
pub fn schema_for(kind: ComponentKind) -> &'static KindSchema {
    match kind {
        ComponentKind::Row => &ROW,
        ComponentKind::Column => &COLUMN,
        ComponentKind::Stack => &STACK,
        ComponentKind::Grid => &GRID,
        ComponentKind::ScrollArea => &SCROLL_AREA,
        ComponentKind::Card => &CARD,
        ComponentKind::Modal => &MODAL,
        ComponentKind::Tooltip => &TOOLTIP,
        ComponentKind::Text => &TEXT,
        ComponentKind::Image => &IMAGE,
        ComponentKind::Icon => &ICON,
        ComponentKind::Video => &VIDEO,
        ComponentKind::Markdown => &MARKDOWN,
        ComponentKind::Divider => &DIVIDER,
        ComponentKind::Badge => &BADGE,
        ComponentKind::Avatar => &AVATAR,
        ComponentKind::Progress => &PROGRESS,
        ComponentKind::Spinner => &SPINNER,
        ComponentKind::Button => &BUTTON,
        ComponentKind::TextField => &TEXT_FIELD,
        ComponentKind::Select => &SELECT,
        ComponentKind::Slider => &SLIDER,
        ComponentKind::Checkbox => &CHECKBOX,
        ComponentKind::Switch => &SWITCH,
        ComponentKind::Link => &LINK,
        ComponentKind::WidgetInstance => &WIDGET_INSTANCE,
    }
}
