use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

/// A city/temperature entry as served by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct Record {
    pub id: u64,
    pub city_name: String,
    /// Degrees Celsius, `None` when no reading is available.
    pub temperature: Option<f64>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Record as it appears on the wire, before its temperature is checked.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: u64,
    pub city_name: String,
    #[serde(default)]
    pub temperature: Value,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
}

/// Wire timestamps. RFC 3339, or ISO 8601 without an offset, read as UTC.
mod timestamp {
    use serde::{de::Error as _, Deserialize, Deserializer};
    use time::{
        format_description::{well_known::Rfc3339, FormatItem},
        macros::format_description,
        OffsetDateTime, PrimitiveDateTime,
    };

    const NAIVE: &[FormatItem<'static>] = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );

    pub fn parse(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(text, &Rfc3339).or_else(|err| {
            PrimitiveDateTime::parse(text, NAIVE)
                .map(PrimitiveDateTime::assume_utc)
                .map_err(|_| err)
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<OffsetDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(D::Error::custom)
    }

    pub mod option {
        use serde::{de::Error as _, Deserialize, Deserializer};
        use time::OffsetDateTime;

        use super::parse;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<OffsetDateTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|text| parse(&text).map_err(D::Error::custom))
                .transpose()
        }
    }
}

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum RecordError {
    #[error("Invalid record {id}: {reason}")]
    #[diagnostic(
        code(citytemp::record::invalid),
        help("the record store returned data that does not match its contract")
    )]
    InvalidRecord { id: u64, reason: String },
    #[error("City name must not be empty")]
    #[diagnostic(code(citytemp::record::empty_city))]
    EmptyCityName,
}

impl TryFrom<RawRecord> for Record {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let id = raw.id;
        if raw.city_name.trim().is_empty() {
            return Err(RecordError::InvalidRecord {
                id,
                reason: String::from("empty city name"),
            });
        }

        let temperature = match raw.temperature {
            Value::Null => None,
            Value::Number(number) => match number.as_f64() {
                Some(t) if t.is_finite() => Some(t),
                _ => {
                    return Err(RecordError::InvalidRecord {
                        id,
                        reason: format!("temperature {number} is not a finite number"),
                    })
                }
            },
            other => {
                return Err(RecordError::InvalidRecord {
                    id,
                    reason: format!("temperature must be a number or null, found `{other}`"),
                })
            }
        };

        Ok(Self {
            id,
            city_name: raw.city_name,
            temperature,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.temperature {
            Some(t) => write!(f, "{} - {t}°C", self.city_name),
            None => write!(f, "{} - N/A", self.city_name),
        }
    }
}

/// The writable part of a record, sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDraft {
    pub city_name: String,
    pub temperature: Option<f64>,
}

impl RecordDraft {
    pub fn new(city_name: &str, temperature: Option<f64>) -> Result<Self, RecordError> {
        let city_name = city_name.trim();
        if city_name.is_empty() {
            return Err(RecordError::EmptyCityName);
        }
        Ok(Self {
            city_name: city_name.to_string(),
            temperature,
        })
    }
}

/// First record whose name matches `city` ignoring case.
pub fn find_by_name<'a>(records: &'a [Record], city: &str) -> Option<&'a Record> {
    let city = city.to_lowercase();
    records
        .iter()
        .find(|record| record.city_name.to_lowercase() == city)
}
