//! Normalized transit records.
//!
//! This module contains the FPTF-style output types of the translation
//! layer. They carry stable field names and serialize with explicit
//! `type` discriminants, so downstream consumers are decoupled from the
//! ExtXML wire format entirely.

mod operator;
mod place;

pub use operator::Operator;
pub use place::{Coordinate, Location, Place, Station};
