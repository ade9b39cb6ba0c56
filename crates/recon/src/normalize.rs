//! Type-aware coercion of raw values into a comparable form.
//!
//! Equality on [`ComparableValue`] is deliberately not reflexive for
//! [`ComparableValue::Invalid`]: a numeric field that fails to parse on
//! either side always surfaces as a discrepancy.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::{FieldType, RawValue};

/// Date layouts tried in order after RFC 3339 and ISO datetimes.
/// Slash-separated day-first dates are not accepted; `MM/DD/YYYY` wins.
pub const BUILTIN_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone)]
pub enum ComparableValue {
    /// Attribute absent or null.
    Missing,
    /// Numeric field with non-numeric input. Never equal to anything.
    Invalid,
    Number(f64),
    /// Currency amount in minor units (cents).
    Cents(i64),
    Text(String),
    Date(NaiveDate),
}

impl PartialEq for ComparableValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Invalid, _) | (_, Self::Invalid) => false,
            (Self::Missing, Self::Missing) => true,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Cents(a), Self::Cents(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

/// Normalizer with optional extra date layouts (chrono format strings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalizer {
    date_formats: Vec<String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_formats(date_formats: Vec<String>) -> Self {
        Self { date_formats }
    }

    pub fn date_formats(&self) -> &[String] {
        &self.date_formats
    }

    pub fn normalize(&self, raw: Option<&RawValue>, field_type: FieldType) -> ComparableValue {
        let raw = match raw {
            None | Some(RawValue::Null) => return ComparableValue::Missing,
            Some(v) => v,
        };

        match field_type {
            FieldType::Number => match parse_number(raw) {
                Some(n) => ComparableValue::Number(n),
                None => ComparableValue::Invalid,
            },
            FieldType::Currency => match parse_number(raw).and_then(to_cents) {
                Some(c) => ComparableValue::Cents(c),
                None => ComparableValue::Invalid,
            },
            FieldType::Text => ComparableValue::Text(canonical_text(raw)),
            FieldType::Date => match raw {
                RawValue::Text(s) => match self.parse_date(s) {
                    Some(d) => ComparableValue::Date(d),
                    None => ComparableValue::Text(canonical_text(raw)),
                },
                _ => ComparableValue::Text(canonical_text(raw)),
            },
        }
    }

    /// Parse a calendar date, discarding any time-of-day component.
    pub fn parse_date(&self, input: &str) -> Option<NaiveDate> {
        let s = input.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        }
        BUILTIN_DATE_FORMATS
            .iter()
            .copied()
            .chain(self.date_formats.iter().map(String::as_str))
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    }
}

/// Normalize with the built-in date layouts only.
pub fn normalize(raw: Option<&RawValue>, field_type: FieldType) -> ComparableValue {
    Normalizer::default().normalize(raw, field_type)
}

fn parse_number(raw: &RawValue) -> Option<f64> {
    let n = match raw {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            if cleaned.is_empty() {
                return None;
            }
            cleaned.parse::<f64>().ok()?
        }
        RawValue::Bool(_) | RawValue::Null => return None,
    };
    n.is_finite().then_some(n)
}

fn to_cents(n: f64) -> Option<i64> {
    let cents = (n * 100.0).round();
    (cents.abs() < i64::MAX as f64).then_some(cents as i64)
}

fn canonical_text(raw: &RawValue) -> String {
    raw.to_string().trim().to_lowercase()
}
