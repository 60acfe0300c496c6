//! ExtXML to FPTF translation client.
//!
//! Talks the HAFAS-family "ExtXML" dialect served by the Saarfahrplan
//! endpoint and converts its responses into normalized, provider-agnostic
//! FPTF-style records (stations, locations, operators, timestamps).

pub mod domain;
pub mod extxml;
