//! Default property values per component kind.
//!
//! New nodes start from these values and normalization fills absent or
//! invalid registered properties from them. Every key here is a registered
//! property of its kind and every value passes that property's check.

use crate::schema::ComponentKind;
use crate::value::{BoundValue, PropValue, Props, SelectOption};

/// Default property bag for `kind`.
#[must_use]
pub fn default_props(kind: ComponentKind) -> Props {
    let mut props = Props::new();
    let mut set = |name: &str, value: PropValue| {
        props.insert(name.to_string(), value);
    };

    match kind {
        ComponentKind::Row | ComponentKind::Column => {
            set("children", PropValue::children(Vec::<String>::new()));
            set("gap", PropValue::string("8px"));
            set("align", PropValue::string("stretch"));
            set("justify", PropValue::string("start"));
        }
        ComponentKind::Stack => {
            set("children", PropValue::children(Vec::<String>::new()));
        }
        ComponentKind::Grid => {
            set("children", PropValue::children(Vec::<String>::new()));
            set("columns", PropValue::number(2.0));
            set("gap", PropValue::string("8px"));
        }
        ComponentKind::ScrollArea => {
            set("direction", PropValue::string("vertical"));
        }
        ComponentKind::Card => {
            set("variant", PropValue::string("default"));
        }
        ComponentKind::Modal => {
            set("open", PropValue::bool(false));
            set("title", PropValue::string("Dialog"));
            set("size", PropValue::string("md"));
        }
        ComponentKind::Tooltip => {
            set("content", PropValue::string("Tooltip"));
            set("side", PropValue::string("top"));
        }
        ComponentKind::Text => {
            set("content", PropValue::string("Text"));
            set("variant", PropValue::string("body"));
        }
        ComponentKind::Image => {
            set("src", PropValue::string(""));
            set("alt", PropValue::string(""));
            set("fit", PropValue::string("cover"));
        }
        ComponentKind::Icon => {
            set("name", PropValue::string("star"));
            set("size", PropValue::string("md"));
        }
        ComponentKind::Video => {
            set("src", PropValue::string(""));
            set("controls", PropValue::bool(true));
        }
        ComponentKind::Markdown => {
            set("content", PropValue::string("# Heading"));
        }
        ComponentKind::Divider => {
            set("orientation", PropValue::string("horizontal"));
        }
        ComponentKind::Badge => {
            set("content", PropValue::string("Badge"));
            set("variant", PropValue::string("default"));
        }
        ComponentKind::Avatar => {
            set("fallback", PropValue::string("?"));
            set("size", PropValue::string("md"));
        }
        ComponentKind::Progress => {
            set("value", PropValue::number(0.0));
            set("max", PropValue::number(100.0));
        }
        ComponentKind::Spinner => {
            set("size", PropValue::string("md"));
        }
        ComponentKind::Button => {
            set("label", PropValue::string("Button"));
            set("variant", PropValue::string("default"));
            set("size", PropValue::string("md"));
        }
        ComponentKind::TextField => {
            set("value", PropValue::string(""));
            set("placeholder", PropValue::string("Enter text"));
            set("inputType", PropValue::string("text"));
        }
        ComponentKind::Select => {
            set("value", PropValue::string(""));
            set(
                "options",
                PropValue::Bound(BoundValue::options(vec![
                    SelectOption::new("Option 1", "option-1"),
                    SelectOption::new("Option 2", "option-2"),
                ])),
            );
            set("placeholder", PropValue::string("Select an option"));
        }
        ComponentKind::Slider => {
            set("value", PropValue::number(50.0));
            set("min", PropValue::number(0.0));
            set("max", PropValue::number(100.0));
            set("step", PropValue::number(1.0));
        }
        ComponentKind::Checkbox | ComponentKind::Switch => {
            set("checked", PropValue::bool(false));
            set("label", PropValue::string("Label"));
        }
        ComponentKind::Link => {
            set("href", PropValue::string("#"));
            set("label", PropValue::string("Link"));
            set("target", PropValue::string("_self"));
        }
        ComponentKind::WidgetInstance => {
            set("instanceId", PropValue::string(""));
        }
    }

    props
}

/// Default value of a single property, if the kind has one.
#[must_use]
pub fn default_prop(kind: ComponentKind, name: &str) -> Option<PropValue> {
    default_props(kind).remove(name)
}
