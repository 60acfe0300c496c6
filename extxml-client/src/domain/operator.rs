//! Transit operator record.

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// The company operating a journey.
///
/// Operators are derived on demand from a journey's attribute list
/// (see [`crate::extxml::resolve_operator`]) and never stored; `id` is
/// the shortest rendering the wire data offers, `name` the longest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub id: String,
    pub name: String,
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Operator", 3)?;
        record.serialize_field("type", "operator")?;
        record.serialize_field("id", &self.id)?;
        record.serialize_field("name", &self.name)?;
        record.end()
    }
}
