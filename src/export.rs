use std::io;

use miette::Diagnostic;
use thiserror::Error;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset};

use crate::record::Record;

const HEADER: [&str; 5] = ["ID", "City Name", "Temperature (°C)", "Created At", "Updated At"];
const TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

#[derive(Debug, Error, Diagnostic)]
pub enum ExportError {
    #[error(transparent)]
    #[diagnostic(code(citytemp::export::csv))]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    #[diagnostic(code(citytemp::export::timestamp))]
    Timestamp(#[from] time::error::Format),
    #[error(transparent)]
    #[diagnostic(code(citytemp::export::io))]
    Io(#[from] io::Error),
}

fn timestamp(at: OffsetDateTime) -> Result<String, ExportError> {
    Ok(at.to_offset(UtcOffset::UTC).format(TIMESTAMP)?)
}

/// Writes the records as CSV, most recently updated first, timestamps in UTC.
pub fn write_csv<W: io::Write>(records: &[Record], writer: W) -> Result<(), ExportError> {
    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for record in ordered {
        let temperature = record
            .temperature
            .map(|t| format!("{t:?}"))
            .unwrap_or_default();
        let created_at = match record.created_at {
            Some(at) => timestamp(at)?,
            None => String::new(),
        };

        csv.write_record([
            record.id.to_string(),
            record.city_name.clone(),
            temperature,
            created_at,
            timestamp(record.updated_at)?,
        ])?;
    }
    csv.flush()?;
    Ok(())
}
