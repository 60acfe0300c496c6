//! FPTF place records.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// A decoded WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A plain location: a named point, optionally with a position.
///
/// Serializes as an FPTF `location` record. The coordinate fields are
/// omitted entirely when the source element carried no position; an
/// unknown position is legitimate data, not an error.
///
/// # Examples
///
/// ```
/// use extxml_client::domain::{Coordinate, Location};
///
/// let here = Location::new("Rathaus", Some(Coordinate { latitude: 49.2, longitude: 7.0 }));
/// assert_eq!(here.name, "Rathaus");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub coordinate: Option<Coordinate>,
}

impl Location {
    pub fn new(name: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self {
            name: name.into(),
            coordinate,
        }
    }
}

/// A station: an externally identified stop with a nested location
/// carrying the same display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: Location,
}

/// A normalized place, as returned by location search.
///
/// Location search can answer with stations or with plain locations
/// (addresses, points of interest, echoed request locations); this is
/// the discriminated union over both.
#[derive(Debug, Clone, PartialEq)]
pub enum Place {
    Station(Station),
    Location(Location),
}

impl Place {
    /// The display name, regardless of variant.
    pub fn name(&self) -> &str {
        match self {
            Place::Station(station) => &station.name,
            Place::Location(location) => &location.name,
        }
    }

    /// The decoded position, if the wire element carried one.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Place::Station(station) => station.location.coordinate,
            Place::Location(location) => location.coordinate,
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.coordinate.is_some() { 4 } else { 2 };
        let mut record = serializer.serialize_struct("Location", fields)?;
        record.serialize_field("type", "location")?;
        record.serialize_field("name", &self.name)?;
        if let Some(coordinate) = &self.coordinate {
            record.serialize_field("latitude", &coordinate.latitude)?;
            record.serialize_field("longitude", &coordinate.longitude)?;
        }
        record.end()
    }
}

impl Serialize for Station {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Station", 4)?;
        record.serialize_field("type", "station")?;
        record.serialize_field("id", &self.id)?;
        record.serialize_field("name", &self.name)?;
        record.serialize_field("location", &self.location)?;
        record.end()
    }
}

impl Serialize for Place {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Place::Station(station) => station.serialize(serializer),
            Place::Location(location) => location.serialize(serializer),
        }
    }
}
