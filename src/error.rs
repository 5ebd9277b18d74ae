use std::io;

use miette::Diagnostic;
use thiserror::Error;

use crate::{
    chart::ChartError, client::ClientError, export::ExportError, record::RecordError,
    summary::SummaryError, temperature::TemperatureError,
};

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Summary(#[from] SummaryError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Temperature(#[from] TemperatureError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Chart(#[from] ChartError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Export(#[from] ExportError),
    #[error("Could not write JSON output")]
    #[diagnostic(code(citytemp::json))]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    #[diagnostic(code(citytemp::io))]
    Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
