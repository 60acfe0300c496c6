//! Interval-tagged journey attributes.
//!
//! A journey carries annotations (operator, category, remarks) that
//! are valid over a range of its stops, each rendered in up to three
//! text variants. Only the operator is resolved into a domain record
//! here; the extraction itself is generic over attribute names.

use std::collections::BTreeMap;

use crate::domain::Operator;

use super::error::ExtXmlError;
use super::xml::Element;

/// Wire tag of one attribute interval.
const JOURNEY_ATTRIBUTE: &str = "JourneyAttribute";

/// Semantic name of operator attributes.
const OPERATOR_ATTRIBUTE: &str = "OPERATOR";

/// Variant preference when picking a compact identifier.
const ID_PREFERENCE: [&str; 3] = ["SHORT", "NORMAL", "LONG"];

/// Variant preference when picking a display name.
const NAME_PREFERENCE: [&str; 3] = ["LONG", "NORMAL", "SHORT"];

/// An annotation valid over a half-open range of a journey's stops.
///
/// Several attributes of the same semantic name may coexist with
/// different ranges, e.g. when a through service changes operator
/// halfway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyAttribute {
    /// Semantic name, e.g. `OPERATOR` or `CATEGORY`.
    pub name: String,
    /// First stop index the attribute applies to.
    pub from: i64,
    /// Stop index the attribute stops applying at.
    pub to: i64,
    /// Text renderings keyed by variant label (`SHORT`, `NORMAL`, `LONG`).
    pub variants: BTreeMap<String, String>,
}

impl JourneyAttribute {
    /// Width of the stop range this attribute covers.
    pub fn span(&self) -> i64 {
        self.to - self.from
    }
}

/// Collect every attribute interval in the document, in document order.
pub fn extract_journey_attributes(
    document: &Element,
) -> Result<Vec<JourneyAttribute>, ExtXmlError> {
    document
        .descendants(JOURNEY_ATTRIBUTE)
        .into_iter()
        .map(convert_journey_attribute)
        .collect()
}

fn convert_journey_attribute(element: &Element) -> Result<JourneyAttribute, ExtXmlError> {
    let from = interval_bound(element, "from")?;
    let to = interval_bound(element, "to")?;

    let attribute = element
        .child("Attribute")
        .ok_or(ExtXmlError::MissingField("Attribute"))?;
    let name = attribute
        .attr("type")
        .ok_or(ExtXmlError::MissingField("Attribute type"))?;

    let mut variants = BTreeMap::new();
    for variant in attribute.children() {
        if variant.local_tag() != "AttributeVariant" {
            continue;
        }
        let label = variant.attr("type");
        let text = variant.child("Text").and_then(Element::text);
        if let (Some(label), Some(text)) = (label, text) {
            variants.insert(label.to_string(), text.to_string());
        }
    }

    Ok(JourneyAttribute {
        name: name.to_string(),
        from,
        to,
        variants,
    })
}

fn interval_bound(element: &Element, attribute: &'static str) -> Result<i64, ExtXmlError> {
    let raw = element
        .attr(attribute)
        .ok_or(ExtXmlError::MissingField(attribute))?;
    raw.parse().map_err(|_| {
        ExtXmlError::Protocol(format!("non-numeric {attribute} bound {raw:?}"))
    })
}

/// Pick the operator for a journey from its attribute list.
///
/// Among `OPERATOR` attributes, the one covering the strictly widest
/// stop range wins; equal spans keep the earliest-seen candidate.
/// Returns `None` when the journey carries no operator attribute at
/// all. The record's `id` is the most compact variant on offer, its
/// `name` the most verbose one.
pub fn resolve_operator(
    attributes: &[JourneyAttribute],
) -> Result<Option<Operator>, ExtXmlError> {
    let mut selected: Option<&JourneyAttribute> = None;
    for attribute in attributes.iter().filter(|a| a.name == OPERATOR_ATTRIBUTE) {
        match selected {
            Some(best) if attribute.span() <= best.span() => {}
            _ => selected = Some(attribute),
        }
    }

    let Some(operator) = selected else {
        return Ok(None);
    };

    let id = preferred_variant(operator, &ID_PREFERENCE);
    let name = preferred_variant(operator, &NAME_PREFERENCE);
    match (id, name) {
        (Some(id), Some(name)) => Ok(Some(Operator {
            id: id.to_string(),
            name: name.to_string(),
        })),
        // A well-formed attribute always has at least one variant,
        // but the wire data is not to be trusted on that.
        _ => Err(ExtXmlError::MissingField("operator variant text")),
    }
}

fn preferred_variant<'a>(attribute: &'a JourneyAttribute, order: &[&str]) -> Option<&'a str> {
    order
        .iter()
        .find_map(|label| attribute.variants.get(*label).map(String::as_str))
}
