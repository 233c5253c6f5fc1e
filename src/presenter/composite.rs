//! Multi-part attribute assembly
//!
//! Form inputs such as `user_birthday(1i)`, `user_birthday(2i)` ... carry one
//! component of a temporal value each. Fragments are grouped by base name and
//! assembled into a single value before routing.

use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::domain::{AttributeKind, Value};
use crate::error::{PresenterError, PresenterResult};

/// Cast marker after the ordinal, e.g. the `i` in `(3i)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentCast {
    Integer,
    Float,
    Text,
    Untyped,
}

/// One parsed `(Nx)` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub position: u8,
    pub cast: FragmentCast,
}

/// Fragments of one base attribute, keyed by position
pub type Parts = BTreeMap<u8, (FragmentCast, Value)>;

const PART_NAMES: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

/// Split `base(Nx)` into its base name and fragment marker
pub fn parse_key(key: &str) -> Option<(&str, Fragment)> {
    let inner = key.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let (base, marker) = (&inner[..open], &inner[open + 1..]);
    if base.is_empty() {
        return None;
    }

    let (digits, cast) = match marker.chars().last()? {
        'i' => (&marker[..marker.len() - 1], FragmentCast::Integer),
        'f' => (&marker[..marker.len() - 1], FragmentCast::Float),
        's' => (&marker[..marker.len() - 1], FragmentCast::Text),
        _ => (marker, FragmentCast::Untyped),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let position: u8 = digits.parse().ok()?;
    if position == 0 {
        return None;
    }

    Some((base, Fragment { position, cast }))
}

/// Assemble the fragments of `attribute` into one value of `kind`.
///
/// All-blank input yields `Value::Null`. Missing time-of-day parts are zero.
pub fn assemble(attribute: &str, kind: AttributeKind, parts: &Parts) -> PresenterResult<Value> {
    let count = match kind {
        AttributeKind::Timestamp => 6,
        AttributeKind::Date => 3,
        other => {
            return Err(PresenterError::invalid_composite(
                attribute,
                format!("{} attributes cannot be assembled from parts", other),
            ))
        }
    };

    if parts.values().all(|(_, value)| value.is_blank()) {
        return Ok(Value::Null);
    }

    let mut components = [0i64; 6];
    for (&position, (cast, value)) in parts {
        let index = usize::from(position) - 1;
        if index >= count {
            return Err(PresenterError::invalid_composite(
                attribute,
                format!("unexpected part {} for a {} value", position, kind),
            ));
        }
        if let Some(number) = component(attribute, index, *cast, value)? {
            components[index] = number;
        } else if index < 3 {
            return Err(missing(attribute, index));
        }
    }
    for index in 0..3 {
        if !parts.contains_key(&((index + 1) as u8)) {
            return Err(missing(attribute, index));
        }
    }

    let [year, month, day, hour, minute, second] = components;
    let date = ymd(year, month, day).ok_or_else(|| {
        PresenterError::invalid_composite(
            attribute,
            format!("{}-{}-{} is not a valid date", year, month, day),
        )
    })?;

    if kind == AttributeKind::Date {
        return Ok(Value::Date(date));
    }

    let time = hms(hour, minute, second).and_then(|(h, m, s)| date.and_hms_opt(h, m, s));
    match time {
        Some(naive) => Ok(Value::Timestamp(Utc.from_utc_datetime(&naive))),
        None => Err(PresenterError::invalid_composite(
            attribute,
            format!("{:02}:{:02}:{:02} is not a valid time", hour, minute, second),
        )),
    }
}

fn component(
    attribute: &str,
    index: usize,
    cast: FragmentCast,
    value: &Value,
) -> PresenterResult<Option<i64>> {
    let unparseable = || {
        PresenterError::invalid_composite(
            attribute,
            format!("{} '{}' is not a number", PART_NAMES[index], value),
        )
    };

    match value {
        value if value.is_blank() => Ok(None),
        Value::Integer(number) => Ok(Some(*number)),
        Value::Float(number) if number.is_finite() => Ok(Some(number.trunc() as i64)),
        Value::Text(text) => {
            let text = text.trim();
            match cast {
                FragmentCast::Float => text
                    .parse::<f64>()
                    .ok()
                    .filter(|number| number.is_finite())
                    .map(|number| Some(number.trunc() as i64))
                    .ok_or_else(unparseable),
                _ => text.parse::<i64>().map(Some).map_err(|_| unparseable()),
            }
        }
        _ => Err(unparseable()),
    }
}

fn missing(attribute: &str, index: usize) -> PresenterError {
    PresenterError::invalid_composite(attribute, format!("missing {}", PART_NAMES[index]))
}

fn ymd(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
}

fn hms(hour: i64, minute: i64, second: i64) -> Option<(u32, u32, u32)> {
    Some((
        u32::try_from(hour).ok()?,
        u32::try_from(minute).ok()?,
        u32::try_from(second).ok()?,
    ))
}
