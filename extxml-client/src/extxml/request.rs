//! Request construction for the ExtXML endpoint.
//!
//! Builds `ReqC` documents ready to POST: location searches plus the
//! auxiliary `RFlags`/`ReqT` fragments a journey-search request is
//! composed of. No network I/O happens here.

use chrono::{NaiveDate, NaiveTime};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::writer::Writer;

use super::error::ExtXmlError;
use super::xml::encode_latin1;

/// Protocol version pinned by the endpoint.
const PROTOCOL_VERSION: &str = "1.2";

/// Product identifier the endpoint expects.
const PRODUCT: &str = "ivi";

/// Interface language.
const LANGUAGE: &str = "DE";

/// What a location query should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Station,
    Address,
    /// Point of interest.
    Poi,
    /// Match anything the server knows.
    Any,
}

impl LocationKind {
    /// The code this kind is spelled as on the wire.
    pub fn wire_code(self) -> &'static str {
        match self {
            LocationKind::Station => "ST",
            LocationKind::Address => "ADR",
            LocationKind::Poi => "POI",
            LocationKind::Any => "ALLTYPE",
        }
    }
}

/// One location search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub kind: LocationKind,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Build a location-search request document.
///
/// Each query becomes a `LocValReq` child with a zero-based sequential
/// id; the server echoes that id, which is the only way to restore
/// request order afterwards. Returns ISO-8859-1 bytes ready to POST.
pub fn build_location_search(
    queries: &[SearchQuery],
    access_token: &str,
) -> Result<Vec<u8>, ExtXmlError> {
    let mut writer = Writer::new(Vec::new());

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("iso8859-1"), None)),
    )?;

    let mut root = BytesStart::new("ReqC");
    root.push_attribute(("ver", PROTOCOL_VERSION));
    root.push_attribute(("prod", PRODUCT));
    root.push_attribute(("lang", LANGUAGE));
    root.push_attribute(("accessId", access_token));
    write_event(&mut writer, Event::Start(root))?;

    for (id, query) in queries.iter().enumerate() {
        let mut request = BytesStart::new("LocValReq");
        request.push_attribute(("id", id.to_string().as_str()));
        write_event(&mut writer, Event::Start(request))?;

        let mut location = BytesStart::new("ReqLoc");
        location.push_attribute(("match", query.text.as_str()));
        location.push_attribute(("type", query.kind.wire_code()));
        write_event(&mut writer, Event::Empty(location))?;

        write_event(&mut writer, Event::End(BytesEnd::new("LocValReq")))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("ReqC")))?;

    let document = String::from_utf8(writer.into_inner())
        .map_err(|e| ExtXmlError::Protocol(format!("request serialization produced invalid UTF-8: {e}")))?;
    Ok(encode_latin1(&document))
}

fn write_event<W: std::io::Write>(
    writer: &mut Writer<W>,
    event: Event<'_>,
) -> Result<(), ExtXmlError> {
    writer
        .write_event(event)
        .map_err(|e| ExtXmlError::Protocol(format!("failed to serialize request: {e}")))
}

/// Route search flags (`RFlags`) for a journey request.
///
/// The endpoint caps how many connections it returns around the
/// requested time and how many changes it will consider; the
/// constructors reject values beyond those caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteFlags {
    nbefore: u8,
    nafter: u8,
    changes: Option<u8>,
    price_mode: bool,
}

impl RouteFlags {
    /// Connections before (at most 1) and after (at most 5) the
    /// requested time.
    pub fn new(nbefore: u8, nafter: u8) -> Result<Self, ExtXmlError> {
        if nbefore > 1 {
            return Err(ExtXmlError::InvalidArgument(format!(
                "nbefore must be at most 1, got {nbefore}"
            )));
        }
        if nafter > 5 {
            return Err(ExtXmlError::InvalidArgument(format!(
                "nafter must be at most 5, got {nafter}"
            )));
        }
        Ok(Self {
            nbefore,
            nafter,
            changes: None,
            price_mode: false,
        })
    }

    /// Cap the number of changes (at most 6).
    pub fn with_changes(mut self, changes: u8) -> Result<Self, ExtXmlError> {
        if changes > 6 {
            return Err(ExtXmlError::InvalidArgument(format!(
                "changes must be at most 6, got {changes}"
            )));
        }
        self.changes = Some(changes);
        Ok(self)
    }

    /// Switch from the normal search mode to the price-oriented one.
    pub fn with_price_mode(mut self) -> Self {
        self.price_mode = true;
        self
    }

    /// Render as an `RFlags` element.
    pub fn to_xml(&self) -> String {
        let changes = self
            .changes
            .map(|changes| format!(" nrChanges=\"{changes}\""))
            .unwrap_or_default();
        let mode = if self.price_mode { "P" } else { "N" };
        format!(
            "<RFlags b=\"{}\" f=\"{}\"{changes} sMode=\"{mode}\"/>",
            self.nbefore, self.nafter
        )
    }
}

/// Departure-or-arrival time constraint (`ReqT`) for a journey request.
///
/// Departure semantics unless [`TimeSpec::arrival`] is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    date: NaiveDate,
    time: NaiveTime,
    arrival: bool,
}

impl TimeSpec {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time,
            arrival: false,
        }
    }

    /// Interpret the time as the latest arrival instead of the
    /// earliest departure.
    pub fn arrival(mut self) -> Self {
        self.arrival = true;
        self
    }

    /// Render as a `ReqT` element.
    pub fn to_xml(&self) -> String {
        format!(
            "<ReqT a=\"{}\" date=\"{}\" time=\"{}\"/>",
            u8::from(self.arrival),
            self.date.format("%Y%m%d"),
            self.time.format("%H:%M")
        )
    }
}
