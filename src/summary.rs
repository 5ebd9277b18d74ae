//! Aggregate report over a list of records.
//!
//! Aggregates are rounded to two decimals, half away from zero, computed as
//! `(x * 100.0).round() / 100.0` on the `f64` value. Ties that are exact in
//! binary (`0.125`) go away from zero; decimal literals whose product lands just
//! below a tie (`1.005`) go down.

use std::fmt;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_records: usize,
    pub valid_count: usize,
    /// `None` when no record carries a temperature.
    pub stats: Option<TemperatureStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureStats {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    pub hottest_city: Option<String>,
    pub coldest_city: Option<String>,
}

#[derive(Debug, Error, Diagnostic, PartialEq)]
pub enum SummaryError {
    #[error("Invalid record {id}: temperature {temperature} is not a finite number")]
    #[diagnostic(code(citytemp::summary::invalid_record))]
    InvalidRecord { id: u64, temperature: f64 },
}

pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    // Magnitudes this large have no fractional digits left.
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Computes count, average and extremes over the records with a temperature.
///
/// When several records share the extreme after rounding, the first one in
/// input order names the city.
pub fn summarize(records: &[Record]) -> Result<Summary, SummaryError> {
    let mut valid = Vec::with_capacity(records.len());
    for record in records {
        if let Some(temperature) = record.temperature {
            if !temperature.is_finite() {
                return Err(SummaryError::InvalidRecord {
                    id: record.id,
                    temperature,
                });
            }
            valid.push((record, temperature));
        }
    }

    let mut summary = Summary {
        total_records: records.len(),
        valid_count: valid.len(),
        stats: None,
    };
    if valid.is_empty() {
        return Ok(summary);
    }

    let count = valid.len() as f64;
    let sum: f64 = valid.iter().map(|(_, t)| t).sum();
    let mean = if sum.is_finite() {
        sum / count
    } else {
        valid.iter().map(|(_, t)| t / count).sum()
    };
    let average = round2(mean);
    let max = round2(
        valid
            .iter()
            .map(|(_, t)| *t)
            .fold(f64::NEG_INFINITY, f64::max),
    );
    let min = round2(valid.iter().map(|(_, t)| *t).fold(f64::INFINITY, f64::min));

    let city_at = |target: f64| {
        valid
            .iter()
            .find(|(_, t)| round2(*t) == target)
            .map(|(record, _)| record.city_name.clone())
    };

    summary.stats = Some(TemperatureStats {
        average,
        max,
        min,
        hottest_city: city_at(max),
        coldest_city: city_at(min),
    });
    Ok(summary)
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(stats) = &self.stats else {
            return write!(f, "No temperature data available for analysis.");
        };
        let city = |name: &Option<String>| name.clone().unwrap_or_else(|| String::from("N/A"));

        writeln!(f, "Total Cities: {}", self.total_records)?;
        writeln!(f, "Cities with Temperature Data: {}", self.valid_count)?;
        writeln!(f, "Average Temperature: {:.2}°C", stats.average)?;
        writeln!(
            f,
            "Highest Temperature: {:.2}°C ({})",
            stats.max,
            city(&stats.hottest_city)
        )?;
        write!(
            f,
            "Lowest Temperature: {:.2}°C ({})",
            stats.min,
            city(&stats.coldest_city)
        )
    }
}
