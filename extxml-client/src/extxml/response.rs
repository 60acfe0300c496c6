//! Response envelope parsing and dispatch.
//!
//! Validates the `ResC` root, demultiplexes the child responses
//! through a closed tag set, and regroups location results into
//! request order.

use tracing::warn;

use crate::domain::Place;

use super::convert;
use super::error::ExtXmlError;
use super::xml::Element;

/// Expected root tag of every ExtXML response.
const RESPONSE_ROOT: &str = "ResC";

/// Wire tag of a location validation response.
const LOC_VAL_RES: &str = "LocValRes";

/// The kinds of child responses this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// `LocValRes`: location search results.
    LocationValidation,
}

/// One decoded child response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseItem {
    LocationValidation(LocationMatches),
}

impl ResponseItem {
    pub fn kind(&self) -> ResponseKind {
        match self {
            ResponseItem::LocationValidation(_) => ResponseKind::LocationValidation,
        }
    }
}

/// Location search results for one echoed request id.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMatches {
    /// The id echoed by the server; the only link back to the request
    /// position, since response order is not guaranteed.
    pub request_id: u32,
    pub places: Vec<Place>,
}

/// A validated, demultiplexed response document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    kind: Option<ResponseKind>,
    items: Vec<ResponseItem>,
}

impl ResponseEnvelope {
    /// The kind shared by the response items; `None` for an empty
    /// envelope. The protocol never mixes kinds within one envelope,
    /// so only the first item is consulted.
    pub fn kind(&self) -> Option<ResponseKind> {
        self.kind
    }

    pub fn items(&self) -> &[ResponseItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<ResponseItem> {
        self.items
    }
}

/// Validate and demultiplex a response document.
///
/// An unregistered child tag fails the whole call: partial results
/// would silently hide whatever the server was trying to say, so the
/// unknown payload is reported instead, with a dump attached for
/// inspection.
pub fn parse_response(document: &Element) -> Result<ResponseEnvelope, ExtXmlError> {
    if document.local_tag() != RESPONSE_ROOT {
        return Err(ExtXmlError::Protocol(format!(
            "expected <{RESPONSE_ROOT}> response root, got <{}>",
            document.local_tag()
        )));
    }

    let mut items = Vec::with_capacity(document.children().len());
    for child in document.children() {
        items.push(convert_response_element(child)?);
    }

    let kind = items.first().map(ResponseItem::kind);
    Ok(ResponseEnvelope { kind, items })
}

/// Route one child response to its converter by stripped tag.
fn convert_response_element(element: &Element) -> Result<ResponseItem, ExtXmlError> {
    match element.local_tag() {
        LOC_VAL_RES => Ok(ResponseItem::LocationValidation(convert_loc_val_res(
            element,
        )?)),
        other => {
            let dump = element.dump();
            warn!(tag = other, %dump, "unrecognized response element");
            Err(ExtXmlError::UnknownElement {
                tag: other.to_string(),
                dump,
            })
        }
    }
}

fn convert_loc_val_res(element: &Element) -> Result<LocationMatches, ExtXmlError> {
    let raw_id = element
        .attr("id")
        .ok_or(ExtXmlError::MissingField("LocValRes id"))?;
    let request_id = raw_id.parse().map_err(|_| {
        ExtXmlError::Protocol(format!("non-numeric LocValRes id {raw_id:?}"))
    })?;
    let places = convert::convert_location_batch(element.children())?;
    Ok(LocationMatches { request_id, places })
}

/// Regroup location results into request order.
///
/// Sorts the sub-responses by their echoed request id, so callers get
/// their lists back in the order they asked, whatever order the
/// server answered in. Fails when the envelope does not hold location
/// search results.
pub fn collate_location_results(
    envelope: ResponseEnvelope,
) -> Result<Vec<Vec<Place>>, ExtXmlError> {
    if envelope.kind() != Some(ResponseKind::LocationValidation) {
        return Err(ExtXmlError::InvalidArgument(
            "envelope does not hold location search results".to_string(),
        ));
    }

    let mut matches: Vec<LocationMatches> = envelope
        .into_items()
        .into_iter()
        .map(|item| match item {
            ResponseItem::LocationValidation(matches) => matches,
        })
        .collect();
    matches.sort_by_key(|matches| matches.request_id);

    Ok(matches.into_iter().map(|matches| matches.places).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> Element {
        Element::parse(xml).unwrap()
    }

    #[test]
    fn root_tag_is_validated() {
        let document = parse("<ConRes xmlns=\"urn:ExtXml\"/>");
        assert!(matches!(
            parse_response(&document),
            Err(ExtXmlError::Protocol(_))
        ));
    }

    #[test]
    fn empty_envelope_has_no_kind() {
        let document = parse("<ResC xmlns=\"urn:ExtXml\"/>");
        let envelope = parse_response(&document).unwrap();

        assert_eq!(envelope.kind(), None);
        assert!(envelope.items().is_empty());
    }

    #[test]
    fn location_results_are_decoded() {
        let document = parse(
            "<ResC xmlns=\"urn:ExtXml\">\
                <LocValRes id=\"0\">\
                    <Station name=\"Saarbrücken Hbf\" externalId=\"8000323\" x=\"70\" y=\"4900\"/>\
                </LocValRes>\
            </ResC>",
        );

        let envelope = parse_response(&document).unwrap();
        assert_eq!(envelope.kind(), Some(ResponseKind::LocationValidation));
        assert_eq!(envelope.items().len(), 1);

        let ResponseItem::LocationValidation(matches) = &envelope.items()[0];
        assert_eq!(matches.request_id, 0);
        assert_eq!(matches.places.len(), 1);
        assert_eq!(matches.places[0].name(), "Saarbrücken Hbf");
    }

    #[test]
    fn unregistered_child_tag_fails_the_whole_call() {
        let document = parse(
            "<ResC xmlns=\"urn:ExtXml\">\
                <LocValRes id=\"0\"><Address name=\"ok\"/></LocValRes>\
                <ConRes/>\
            </ResC>",
        );

        assert!(matches!(
            parse_response(&document),
            Err(ExtXmlError::UnknownElement { tag, .. }) if tag == "ConRes"
        ));
    }

    #[test]
    fn missing_request_id_is_reported() {
        let document = parse("<ResC xmlns=\"urn:ExtXml\"><LocValRes/></ResC>");
        assert!(matches!(
            parse_response(&document),
            Err(ExtXmlError::MissingField("LocValRes id"))
        ));
    }

    #[test]
    fn collation_restores_request_order() {
        let document = parse(
            "<ResC xmlns=\"urn:ExtXml\">\
                <LocValRes id=\"1\"><Address name=\"second\"/></LocValRes>\
                <LocValRes id=\"0\"><Address name=\"first\"/></LocValRes>\
            </ResC>",
        );

        let envelope = parse_response(&document).unwrap();
        let results = collate_location_results(envelope).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0][0].name(), "first");
        assert_eq!(results[1][0].name(), "second");
    }

    #[test]
    fn collation_orders_ids_numerically() {
        // Ten and up must sort after two; string order would not.
        let children: String = [10u32, 2, 0]
            .iter()
            .map(|id| {
                format!("<LocValRes id=\"{id}\"><Address name=\"r{id}\"/></LocValRes>")
            })
            .collect();
        let document = parse(&format!("<ResC xmlns=\"urn:ExtXml\">{children}</ResC>"));

        let envelope = parse_response(&document).unwrap();
        let results = collate_location_results(envelope).unwrap();

        let names: Vec<_> = results.iter().map(|r| r[0].name()).collect();
        assert_eq!(names, ["r0", "r2", "r10"]);
    }

    #[test]
    fn collation_rejects_empty_envelopes() {
        let document = parse("<ResC xmlns=\"urn:ExtXml\"/>");
        let envelope = parse_response(&document).unwrap();

        assert!(matches!(
            collate_location_results(envelope),
            Err(ExtXmlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn invalid_items_inside_a_result_are_dropped_not_fatal() {
        let document = parse(
            "<ResC xmlns=\"urn:ExtXml\">\
                <LocValRes id=\"0\">\
                    <Address x=\"1\" y=\"2\"/>\
                    <Address name=\"kept\"/>\
                </LocValRes>\
            </ResC>",
        );

        let envelope = parse_response(&document).unwrap();
        let results = collate_location_results(envelope).unwrap();

        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].name(), "kept");
    }
}
