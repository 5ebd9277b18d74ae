pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod record;
pub mod summary;
pub mod telemetry;
pub mod temperature;

pub use chart::{ChartData, TemperatureChart};
pub use client::{ApiClient, SaveOutcome, Transport, UreqTransport, WeatherFetch};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use record::{Record, RecordDraft};
pub use summary::{summarize, Summary, TemperatureStats};
pub use temperature::parse_temperature;
