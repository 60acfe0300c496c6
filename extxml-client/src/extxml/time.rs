//! Wire time decoding.
//!
//! ExtXML carries times as `[D]dHH:MM[:SS]`: a time of day plus an
//! optional day offset from "today", with no calendar date and no UTC
//! offset. Both are reconstructed from a reference instant in the
//! endpoint's zone, which callers inject so decoding stays
//! deterministic under test.
//!
//! The calendar date always derives from the reference instant plus
//! the day offset, never from any date the surrounding request or
//! response may carry; that is how the protocol's own clients behave,
//! wrong-date edge cases at large offsets included.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone};
use chrono_tz::{OffsetComponents, Tz};

use super::error::ExtXmlError;
use super::xml::Element;

const SECS_PER_HOUR: i32 = 3600;

/// Decode a `[D]dHH:MM[:SS]` wire time against a reference instant.
///
/// A `d` marker separates the integer day offset from the time of
/// day; without one the offset is zero. Counting the day offset as
/// one component, anything other than 3 or 4 components is malformed.
/// The UTC offset is `+02:00` while the reference zone observes
/// daylight saving time and `+01:00` otherwise. The wire carries no
/// offset of its own, so it comes from the reference instant's zone
/// rules, not from the decoded date.
///
/// # Examples
///
/// ```
/// use chrono::TimeZone;
/// use extxml_client::extxml::decode_wire_time;
///
/// let reference = chrono_tz::Europe::Berlin
///     .with_ymd_and_hms(2024, 7, 10, 12, 0, 0)
///     .unwrap();
///
/// let decoded = decode_wire_time("1d08:30", reference).unwrap();
/// assert_eq!(decoded.to_rfc3339(), "2024-07-11T08:30:00+02:00");
/// ```
pub fn decode_wire_time(
    raw: &str,
    reference: DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ExtXmlError> {
    let malformed = || ExtXmlError::MalformedTime(raw.to_string());

    let (day_offset, time_part) = match raw.split_once('d') {
        Some((day, rest)) => (day.parse::<i64>().map_err(|_| malformed())?, rest),
        None => (0, raw),
    };

    if !time_part.is_ascii() {
        return Err(malformed());
    }
    // The time of day is at most HH:MM:SS wide; longer tails keep
    // their trailing 8 characters.
    let time_part = if time_part.len() > 8 {
        &time_part[time_part.len() - 8..]
    } else {
        time_part
    };

    let parts: Vec<&str> = time_part.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return Err(malformed());
    }

    let hour: u32 = parts[0].parse().map_err(|_| malformed())?;
    let minute: u32 = parts[1].parse().map_err(|_| malformed())?;
    let second: u32 = match parts.get(2) {
        Some(part) => part.parse().map_err(|_| malformed())?,
        None => 0,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(malformed)?;

    let offset_days = Duration::try_days(day_offset).ok_or_else(malformed)?;
    let date = reference
        .date_naive()
        .checked_add_signed(offset_days)
        .ok_or_else(malformed)?;

    reference_offset(reference)
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(malformed)
}

/// The UTC offset the endpoint's clock is using at the reference
/// instant.
fn reference_offset(reference: DateTime<Tz>) -> FixedOffset {
    let in_dst = !reference.offset().dst_offset().is_zero();
    let hours = if in_dst { 2 } else { 1 };
    FixedOffset::east_opt(hours * SECS_PER_HOUR).expect("offset is within bounds")
}

/// Scheduled departure of a stop element (`Dep` → `Time`).
pub fn departure_time(
    stop: &Element,
    reference: DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ExtXmlError> {
    scheduled_time(stop, "Dep", reference)
}

/// Scheduled arrival of a stop element (`Arr` → `Time`).
pub fn arrival_time(
    stop: &Element,
    reference: DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ExtXmlError> {
    scheduled_time(stop, "Arr", reference)
}

fn scheduled_time(
    stop: &Element,
    leg: &'static str,
    reference: DateTime<Tz>,
) -> Result<DateTime<FixedOffset>, ExtXmlError> {
    let raw = stop
        .child(leg)
        .and_then(|leg| leg.child("Time"))
        .and_then(Element::text)
        .ok_or(ExtXmlError::MissingField(leg))?;
    decode_wire_time(raw, reference)
}

/// Departure delay in whole seconds, from the stop's prognosis.
///
/// Delay data is best-effort telemetry: a missing prognosis or an
/// unparsable prognosis time yields `None`, never an error. Negative
/// means the service is expected early.
pub fn departure_delay(
    stop: &Element,
    planned: DateTime<FixedOffset>,
    reference: DateTime<Tz>,
) -> Option<i64> {
    prognosis_delay(stop, "Dep", planned, reference)
}

/// Arrival delay in whole seconds, from the stop's prognosis.
pub fn arrival_delay(
    stop: &Element,
    planned: DateTime<FixedOffset>,
    reference: DateTime<Tz>,
) -> Option<i64> {
    prognosis_delay(stop, "Arr", planned, reference)
}

fn prognosis_delay(
    stop: &Element,
    leg: &str,
    planned: DateTime<FixedOffset>,
    reference: DateTime<Tz>,
) -> Option<i64> {
    let raw = stop
        .child("StopPrognosis")?
        .child(leg)?
        .child("Time")?
        .text()?;
    let actual = decode_wire_time(raw, reference).ok()?;
    Some(actual.signed_duration_since(planned).num_seconds())
}
