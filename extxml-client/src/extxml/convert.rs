//! Conversion from wire elements to FPTF places.
//!
//! This is where the provider-specific shape of the protocol ends:
//! everything downstream of these functions sees only
//! [`crate::domain`] records.

use tracing::debug;

use crate::domain::{Coordinate, Location, Place, Station};

use super::error::ExtXmlError;
use super::xml::Element;

/// Convert a single location-ish element to a place.
///
/// Dispatches on the stripped tag: `Station` elements become stations,
/// `Address`/`POI`/`ReqLoc` elements become plain locations, and any
/// other tag is an unknown element.
pub fn convert_location(element: &Element) -> Result<Place, ExtXmlError> {
    match element.local_tag() {
        "Station" => Ok(Place::Station(convert_station(element)?)),
        "Address" | "POI" | "ReqLoc" => {
            Ok(Place::Location(convert_generic_location(element)?))
        }
        other => Err(ExtXmlError::UnknownElement {
            tag: other.to_string(),
            dump: element.dump(),
        }),
    }
}

/// Convert a `Station` element.
///
/// Stations must carry an external identifier and a display name; the
/// nested location record repeats the name and holds the decoded
/// coordinate.
pub fn convert_station(element: &Element) -> Result<Station, ExtXmlError> {
    let id = element
        .attr("externalId")
        .ok_or(ExtXmlError::MissingField("externalId"))?;
    let name = element.attr("name").ok_or(ExtXmlError::MissingField("name"))?;

    Ok(Station {
        id: id.to_string(),
        name: name.to_string(),
        location: Location::new(name, decode_coordinate(element)),
    })
}

/// Convert an address, POI or echoed request location.
///
/// These share one shape: a `name` attribute, with `output` as the
/// display fallback when `name` is absent.
pub fn convert_generic_location(element: &Element) -> Result<Location, ExtXmlError> {
    let name = element
        .attr("name")
        .or_else(|| element.attr("output"))
        .ok_or(ExtXmlError::MissingField("name"))?;

    Ok(Location::new(name, decode_coordinate(element)))
}

/// Decode the fixed-point `x`/`y` attributes of an element.
///
/// A missing axis is a legitimate "position unknown" case and yields
/// `None`, never an error. The two axes use different divisors on the
/// wire: `latitude = y / 100`, `longitude = x / 10`.
pub fn decode_coordinate(element: &Element) -> Option<Coordinate> {
    let x: f64 = element.attr("x")?.parse().ok()?;
    let y: f64 = element.attr("y")?.parse().ok()?;
    Some(Coordinate {
        latitude: y / 100.0,
        longitude: x / 10.0,
    })
}

/// Convert the children of a location batch.
///
/// Elements that fail their own validation (typically a missing name)
/// are skipped rather than corrupting the list; only an unknown
/// element kind is fatal for the whole batch.
pub fn convert_location_batch(elements: &[Element]) -> Result<Vec<Place>, ExtXmlError> {
    let mut places = Vec::with_capacity(elements.len());
    for element in elements {
        match convert_location(element) {
            Ok(place) => places.push(place),
            Err(err @ ExtXmlError::UnknownElement { .. }) => return Err(err),
            Err(err) => {
                debug!(tag = element.local_tag(), %err, "skipping invalid location element");
            }
        }
    }
    Ok(places)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_element() -> Element {
        Element::new("Station")
            .with_attr("name", "Saarbrücken Hbf")
            .with_attr("externalId", "8000323")
            .with_attr("x", "709910")
            .with_attr("y", "4923930")
    }

    #[test]
    fn station_conversion() {
        let station = convert_station(&station_element()).unwrap();

        assert_eq!(station.id, "8000323");
        assert_eq!(station.name, "Saarbrücken Hbf");
        assert_eq!(station.location.name, station.name);
        assert!(station.location.coordinate.is_some());
    }

    #[test]
    fn station_requires_id_and_name() {
        let missing_id = Element::new("Station").with_attr("name", "Saarbrücken Hbf");
        assert!(matches!(
            convert_station(&missing_id),
            Err(ExtXmlError::MissingField("externalId"))
        ));

        let missing_name = Element::new("Station").with_attr("externalId", "8000323");
        assert!(matches!(
            convert_station(&missing_name),
            Err(ExtXmlError::MissingField("name"))
        ));
    }

    #[test]
    fn coordinate_scaling_is_asymmetric() {
        let element = Element::new("Address")
            .with_attr("name", "anywhere")
            .with_attr("x", "100")
            .with_attr("y", "100");

        let coordinate = decode_coordinate(&element).unwrap();
        assert_eq!(coordinate.longitude, 10.0);
        assert_eq!(coordinate.latitude, 1.0);
    }

    #[test]
    fn coordinate_absent_when_an_axis_is_missing() {
        let only_x = Element::new("Address").with_attr("x", "100");
        assert!(decode_coordinate(&only_x).is_none());

        let only_y = Element::new("Address").with_attr("y", "100");
        assert!(decode_coordinate(&only_y).is_none());

        let neither = Element::new("Address");
        assert!(decode_coordinate(&neither).is_none());
    }

    #[test]
    fn station_coordinate_present_iff_both_axes_present() {
        let with_both = convert_station(&station_element()).unwrap();
        assert!(with_both.location.coordinate.is_some());

        let without_y = Element::new("Station")
            .with_attr("name", "S")
            .with_attr("externalId", "1")
            .with_attr("x", "100");
        let station = convert_station(&without_y).unwrap();
        assert!(station.location.coordinate.is_none());
    }

    #[test]
    fn generic_location_falls_back_to_output_attribute() {
        let with_name = Element::new("Address").with_attr("name", "Main St");
        assert_eq!(
            convert_generic_location(&with_name).unwrap().name,
            "Main St"
        );

        let with_output = Element::new("ReqLoc").with_attr("output", "Main St 1, Saarbrücken");
        assert_eq!(
            convert_generic_location(&with_output).unwrap().name,
            "Main St 1, Saarbrücken"
        );

        let with_both = Element::new("Address")
            .with_attr("name", "primary")
            .with_attr("output", "secondary");
        assert_eq!(convert_generic_location(&with_both).unwrap().name, "primary");
    }

    #[test]
    fn generic_location_without_any_name_is_missing_field() {
        let nameless = Element::new("POI").with_attr("x", "1").with_attr("y", "2");
        assert!(matches!(
            convert_generic_location(&nameless),
            Err(ExtXmlError::MissingField("name"))
        ));
    }

    #[test]
    fn dispatch_rejects_unknown_tags() {
        let unknown = Element::new("Journey");
        assert!(matches!(
            convert_location(&unknown),
            Err(ExtXmlError::UnknownElement { tag, .. }) if tag == "Journey"
        ));
    }

    #[test]
    fn batch_skips_invalid_items_but_keeps_valid_ones() {
        let elements = [
            Element::new("Address").with_attr("x", "1").with_attr("y", "2"),
            Element::new("Address").with_attr("name", "Main St"),
        ];

        let places = convert_location_batch(&elements).unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name(), "Main St");
    }

    #[test]
    fn batch_fails_on_unknown_element() {
        let elements = [
            Element::new("Address").with_attr("name", "Main St"),
            Element::new("Frobnicate"),
        ];

        assert!(matches!(
            convert_location_batch(&elements),
            Err(ExtXmlError::UnknownElement { .. })
        ));
    }

    #[test]
    fn namespaced_tags_dispatch_like_bare_ones() {
        let element = Element::new("{urn:ExtXml}Station")
            .with_attr("name", "Saarbrücken Hbf")
            .with_attr("externalId", "8000323");

        assert!(matches!(
            convert_location(&element),
            Ok(Place::Station(_))
        ));
    }
}
