//! ExtXML protocol handling.
//!
//! The dialect has a few quirks that shape this module:
//! - requests and responses are ISO-8859-1 encoded XML, and responses
//!   qualify every element with the fixed `urn:ExtXml` namespace
//! - times come as `[D]dHH:MM:SS` day-offset strings carrying neither
//!   a calendar date nor a UTC offset; both must be reconstructed from
//!   a reference clock in the endpoint's zone
//! - batched sub-requests carry numeric ids because the server does
//!   not guarantee response order

mod attributes;
mod client;
mod convert;
mod error;
mod mock;
mod request;
mod response;
mod time;
mod xml;

pub use attributes::{JourneyAttribute, extract_journey_attributes, resolve_operator};
pub use client::{ExtXmlClient, ExtXmlConfig, HttpTransport, Transport};
pub use convert::{
    convert_generic_location, convert_location, convert_location_batch, convert_station,
    decode_coordinate,
};
pub use error::{ExtXmlError, TransportError};
pub use mock::MockTransport;
pub use request::{
    LocationKind, RouteFlags, SearchQuery, TimeSpec, build_location_search,
};
pub use response::{
    LocationMatches, ResponseEnvelope, ResponseItem, ResponseKind, collate_location_results,
    parse_response,
};
pub use time::{arrival_delay, arrival_time, decode_wire_time, departure_delay, departure_time};
pub use xml::{EXTXML_NAMESPACE, Element, decode_latin1, encode_latin1, strip_namespace};
