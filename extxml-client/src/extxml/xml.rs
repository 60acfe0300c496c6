//! Owned element trees for the ExtXML wire format.
//!
//! The protocol pins a single namespace, `urn:ExtXml`, and qualifies
//! every response element with it. Parsed elements carry their tag in
//! `{namespace}Local` form; converters compare bare local names via
//! [`Element::local_tag`] / [`strip_namespace`].
//!
//! Both directions of the wire are ISO-8859-1 encoded; [`decode_latin1`]
//! and [`encode_latin1`] translate between that charset and Rust
//! strings.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use super::error::ExtXmlError;

/// The fixed protocol namespace. Its literal URI is part of the wire
/// contract, not a configuration knob.
pub const EXTXML_NAMESPACE: &str = "urn:ExtXml";

/// The namespace marker as it appears on resolved tags.
const NAMESPACE_MARKER: &str = "{urn:ExtXml}";

/// Reduce a `{urn:ExtXml}Local` tag to `Local`.
///
/// Tags without the protocol namespace marker pass through unchanged;
/// only the one fixed namespace is ever stripped.
///
/// # Examples
///
/// ```
/// use extxml_client::extxml::strip_namespace;
///
/// assert_eq!(strip_namespace("{urn:ExtXml}ResC"), "ResC");
/// assert_eq!(strip_namespace("ResC"), "ResC");
/// assert_eq!(strip_namespace("{urn:other}ResC"), "{urn:other}ResC");
/// ```
pub fn strip_namespace(tag: &str) -> &str {
    tag.strip_prefix(NAMESPACE_MARKER).unwrap_or(tag)
}

/// Decode an ISO-8859-1 body into a string.
///
/// Every byte maps 1:1 to the Unicode code point of the same value, so
/// this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a document string as ISO-8859-1.
///
/// Characters outside Latin-1 become numeric character references,
/// which keeps the byte stream valid under the charset the endpoint
/// expects.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = u32::from(c);
        if code <= 0xFF {
            out.push(code as u8);
        } else {
            out.extend_from_slice(format!("&#{code};").as_bytes());
        }
    }
    out
}

/// One parsed XML element: tag, attributes, children and text content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Create a bare element. Mostly useful together with the `with_*`
    /// builders when assembling documents by hand.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// The tag as parsed, in `{namespace}Local` form when namespaced.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The tag with the protocol namespace marker stripped.
    pub fn local_tag(&self) -> &str {
        strip_namespace(&self.tag)
    }

    /// Look up an attribute by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// The first direct child with the given local tag.
    pub fn child(&self, local_tag: &str) -> Option<&Element> {
        self.children
            .iter()
            .find(|child| child.local_tag() == local_tag)
    }

    /// All descendants with the given local tag, in document order.
    pub fn descendants(&self, local_tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_descendants(local_tag, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local_tag: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.local_tag() == local_tag {
                found.push(child);
            }
            child.collect_descendants(local_tag, found);
        }
    }

    /// Trimmed text content, `None` when empty.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Element, ExtXmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_resolved_event() {
                Ok((ns, Event::Start(start))) => {
                    stack.push(element_from_start(&ns, &start)?);
                }
                Ok((ns, Event::Empty(start))) => {
                    let element = element_from_start(&ns, &start)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok((_, Event::End(_))) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ExtXmlError::Protocol("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => root = Some(element),
                    }
                }
                Ok((_, Event::Text(text))) => {
                    if let Some(open) = stack.last_mut() {
                        let text = text.unescape().map_err(|e| {
                            ExtXmlError::Protocol(format!("malformed text content: {e}"))
                        })?;
                        open.text.push_str(&text);
                    }
                }
                Ok((_, Event::CData(data))) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(e) => return Err(ExtXmlError::Protocol(format!("malformed XML: {e}"))),
            }
        }

        if !stack.is_empty() {
            return Err(ExtXmlError::Protocol(
                "unexpected end of document".to_string(),
            ));
        }
        root.ok_or_else(|| ExtXmlError::Protocol("empty document".to_string()))
    }

    /// Re-serialize this element for diagnostics (error payloads, log
    /// output). Not a faithful writer: namespaces are shown stripped
    /// and no escaping is applied.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out);
        out
    }

    fn dump_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.local_tag());
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}={value:?}");
        }
        if self.children.is_empty() && self.text().is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = self.text() {
            out.push_str(text);
        }
        for child in &self.children {
            child.dump_into(out);
        }
        let _ = write!(out, "</{}>", self.local_tag());
    }
}

fn element_from_start(
    ns: &ResolveResult<'_>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<Element, ExtXmlError> {
    let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let tag = match ns {
        ResolveResult::Bound(Namespace(uri)) => {
            format!("{{{}}}{local}", String::from_utf8_lossy(uri))
        }
        ResolveResult::Unbound => local,
        ResolveResult::Unknown(prefix) => {
            return Err(ExtXmlError::Protocol(format!(
                "undeclared namespace prefix {:?}",
                String::from_utf8_lossy(prefix)
            )));
        }
    };

    let mut attributes = BTreeMap::new();
    for attribute in start.attributes() {
        let attribute = attribute
            .map_err(|e| ExtXmlError::Protocol(format!("malformed attribute: {e}")))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let name = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| ExtXmlError::Protocol(format!("malformed attribute value: {e}")))?;
        attributes.insert(name, value.into_owned());
    }

    Ok(Element {
        tag,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_only_the_protocol_namespace() {
        assert_eq!(strip_namespace("{urn:ExtXml}ResC"), "ResC");
        assert_eq!(strip_namespace("{urn:ExtXml}LocValRes"), "LocValRes");
        assert_eq!(strip_namespace("LocValRes"), "LocValRes");
        assert_eq!(strip_namespace("{urn:Else}ResC"), "{urn:Else}ResC");
    }

    #[test]
    fn parse_namespaced_document() {
        let doc = Element::parse(
            r#"<?xml version="1.0" encoding="iso8859-1"?>
            <ResC xmlns="urn:ExtXml" ver="1.2">
                <LocValRes id="0">
                    <Station name="Saarbr&#252;cken Hbf" externalId="8000323"/>
                </LocValRes>
            </ResC>"#,
        )
        .unwrap();

        assert_eq!(doc.tag(), "{urn:ExtXml}ResC");
        assert_eq!(doc.local_tag(), "ResC");
        assert_eq!(doc.attr("ver"), Some("1.2"));

        let res = doc.child("LocValRes").unwrap();
        assert_eq!(res.attr("id"), Some("0"));

        let station = res.child("Station").unwrap();
        assert_eq!(station.attr("name"), Some("Saarbrücken Hbf"));
        assert_eq!(station.attr("externalId"), Some("8000323"));
    }

    #[test]
    fn parse_without_namespace_keeps_bare_tags() {
        let doc = Element::parse("<ResC><LocValRes id=\"0\"/></ResC>").unwrap();
        assert_eq!(doc.tag(), "ResC");
        assert_eq!(doc.child("LocValRes").unwrap().attr("id"), Some("0"));
    }

    #[test]
    fn text_content_is_accumulated_and_trimmed() {
        let doc = Element::parse("<Text>  Saarbahn GmbH  </Text>").unwrap();
        assert_eq!(doc.text(), Some("Saarbahn GmbH"));

        let empty = Element::parse("<Text></Text>").unwrap();
        assert_eq!(empty.text(), None);
    }

    #[test]
    fn descendants_walk_in_document_order() {
        let doc = Element::parse(
            "<Journey>\
                <JourneyAttributeList>\
                    <JourneyAttribute from=\"0\" to=\"1\"/>\
                    <JourneyAttribute from=\"1\" to=\"2\"/>\
                </JourneyAttributeList>\
                <JourneyAttribute from=\"2\" to=\"3\"/>\
            </Journey>",
        )
        .unwrap();

        let found = doc.descendants("JourneyAttribute");
        let bounds: Vec<_> = found.iter().map(|e| e.attr("from").unwrap()).collect();
        assert_eq!(bounds, ["0", "1", "2"]);
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(Element::parse("").is_err());
        assert!(Element::parse("<ResC>").is_err());
        assert!(Element::parse("<ResC></Mismatch>").is_err());
    }

    #[test]
    fn latin1_roundtrip() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let text = decode_latin1(&bytes);
        assert_eq!(encode_latin1(&text), bytes);
    }

    #[test]
    fn latin1_umlauts_survive() {
        let encoded = encode_latin1("Saarbrücken");
        assert_eq!(encoded, b"Saarbr\xfccken");
        assert_eq!(decode_latin1(&encoded), "Saarbrücken");
    }

    #[test]
    fn non_latin1_characters_become_references() {
        assert_eq!(encode_latin1("€"), b"&#8364;");
    }

    #[test]
    fn dump_shows_structure() {
        let doc = Element::parse("<ConRes xmlns=\"urn:ExtXml\" err=\"OK\"><Err/></ConRes>").unwrap();
        assert_eq!(doc.dump(), "<ConRes err=\"OK\"><Err/></ConRes>");
    }

    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Decoding then encoding arbitrary bytes is the identity.
            #[test]
            fn latin1_decode_encode_identity(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
                prop_assert_eq!(encode_latin1(&decode_latin1(&bytes)), bytes);
            }

            /// Stripping never panics and is idempotent.
            #[test]
            fn strip_namespace_idempotent(tag in "\\PC{0,30}") {
                let once = strip_namespace(&tag);
                prop_assert_eq!(strip_namespace(once), once);
            }
        }
    }
}
