//! Blocking client for the record store's REST API.
//!
//! Requests go through a [`Transport`] so the client can run against the
//! real service ([`UreqTransport`]) or anything else that answers HTTP-shaped
//! requests.

use miette::Diagnostic;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::ClientConfig,
    record::{find_by_name, RawRecord, Record, RecordDraft, RecordError},
};

const RECORDS_PATH: &str = "/api/citytemps/";
const SUGGEST_PATH: &str = "/api/citytemps/by_city/";
const FETCH_WEATHER_PATH: &str = "/fetch_weather/";
const EXPORT_CSV_PATH: &str = "/export_csv/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error, Diagnostic)]
#[error("Could not reach the record store: {0}")]
#[diagnostic(
    code(citytemp::client::transport),
    help("check that the service is running and that --api-base points at it")
)]
pub struct TransportError(pub String);

/// Sends one request and returns whatever the server answered.
///
/// Non-2xx statuses are responses, not errors.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut call = self.agent.request(request.method.as_str(), &url);
        for (key, value) in &request.query {
            call = call.query(key, value);
        }

        let result = match &request.body {
            Some(body) => call.send_json(body),
            None => call.call(),
        };
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(e)) => return Err(TransportError(e.to_string())),
        };

        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ClientError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] TransportError),
    #[error("Nothing found at {path}")]
    #[diagnostic(code(citytemp::client::not_found))]
    NotFound { path: String },
    #[error("Service error ({status}): {message}")]
    #[diagnostic(code(citytemp::client::service))]
    Service { status: u16, message: String },
    #[error("Could not encode the request body")]
    #[diagnostic(code(citytemp::client::encode))]
    Encode(#[source] serde_json::Error),
    #[error("Could not decode the response from {path}")]
    #[diagnostic(code(citytemp::client::decode))]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Record(#[from] RecordError),
}

/// Current reading returned by the weather endpoint, which also stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherFetch {
    pub id: u64,
    pub city_name: String,
    pub temperature: Option<f64>,
    /// Whether the service created a new record rather than updating one.
    pub created: bool,
    #[serde(default)]
    pub raw: WeatherDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherDetails {
    #[serde(default)]
    pub description: String,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Record),
    Updated(Record),
}

impl SaveOutcome {
    pub fn record(&self) -> &Record {
        match self {
            Self::Created(record) | Self::Updated(record) => record,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
    detail: Option<String>,
}

fn service_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(error),
            details: Some(details),
            ..
        }) => format!("{error} ({details})"),
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        Ok(ErrorBody {
            detail: Some(detail),
            ..
        }) => detail,
        _ => body.trim().to_string(),
    }
}

fn record_path(id: u64) -> String {
    format!("{RECORDS_PATH}{id}/")
}

pub struct ApiClient<T> {
    transport: T,
}

impl ApiClient<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(UreqTransport::new(config))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        let response = self.transport.send(&request).map_err(|e| {
            warn!(method = request.method.as_str(), path = %request.path, error = %e, "request failed");
            e
        })?;

        if response.status == 404 {
            warn!(path = %request.path, "not found");
            return Err(ClientError::NotFound { path: request.path });
        }
        if !response.is_success() {
            let message = service_message(&response.body);
            warn!(status = response.status, path = %request.path, %message, "service error");
            return Err(ClientError::Service {
                status: response.status,
                message,
            });
        }
        Ok(response)
    }

    fn decode<D: DeserializeOwned>(path: &str, response: &ApiResponse) -> Result<D, ClientError> {
        serde_json::from_str(&response.body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    fn one(&self, request: ApiRequest) -> Result<Record, ClientError> {
        let path = request.path.clone();
        let response = self.execute(request)?;
        let raw: RawRecord = Self::decode(&path, &response)?;
        Ok(Record::try_from(raw)?)
    }

    fn many(&self, request: ApiRequest) -> Result<Vec<Record>, ClientError> {
        let path = request.path.clone();
        let response = self.execute(request)?;
        let raw: Vec<RawRecord> = Self::decode(&path, &response)?;
        let records = raw
            .into_iter()
            .map(Record::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// All records, optionally narrowed to cities containing `search`.
    pub fn list(&self, search: Option<&str>) -> Result<Vec<Record>, ClientError> {
        let mut request = ApiRequest::new(Method::Get, RECORDS_PATH);
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            request = request.query("search", search);
        }
        self.many(request)
    }

    pub fn get(&self, id: u64) -> Result<Record, ClientError> {
        self.one(ApiRequest::new(Method::Get, record_path(id)))
    }

    pub fn create(&self, draft: &RecordDraft) -> Result<Record, ClientError> {
        let body = serde_json::to_value(draft).map_err(ClientError::Encode)?;
        let record = self.one(ApiRequest::new(Method::Post, RECORDS_PATH).json(body))?;
        info!(id = record.id, city = %record.city_name, "created record");
        Ok(record)
    }

    pub fn update(&self, id: u64, draft: &RecordDraft) -> Result<Record, ClientError> {
        let body = serde_json::to_value(draft).map_err(ClientError::Encode)?;
        let record = self.one(ApiRequest::new(Method::Put, record_path(id)).json(body))?;
        info!(id = record.id, city = %record.city_name, "updated record");
        Ok(record)
    }

    pub fn delete(&self, id: u64) -> Result<(), ClientError> {
        self.execute(ApiRequest::new(Method::Delete, record_path(id)))?;
        info!(id, "deleted record");
        Ok(())
    }

    /// City suggestions for a partial name. Blank input yields nothing and
    /// sends no request.
    pub fn suggest(&self, name: &str) -> Result<Vec<Record>, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(Vec::new());
        }
        self.many(ApiRequest::new(Method::Get, SUGGEST_PATH).query("name", name))
    }

    pub fn fetch_weather(&self, city: &str) -> Result<WeatherFetch, ClientError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(RecordError::EmptyCityName.into());
        }
        let response =
            self.execute(ApiRequest::new(Method::Get, FETCH_WEATHER_PATH).query("city", city))?;
        Self::decode(FETCH_WEATHER_PATH, &response)
    }

    /// Creates the city's record, or updates the existing one whose name
    /// matches ignoring case.
    pub fn save(&self, city: &str, temperature: Option<f64>) -> Result<SaveOutcome, ClientError> {
        let draft = RecordDraft::new(city, temperature)?;
        let candidates = self.list(Some(&draft.city_name))?;

        match find_by_name(&candidates, &draft.city_name) {
            Some(existing) => {
                debug!(id = existing.id, city = %existing.city_name, "city already stored");
                Ok(SaveOutcome::Updated(self.update(existing.id, &draft)?))
            }
            None => Ok(SaveOutcome::Created(self.create(&draft)?)),
        }
    }

    /// Replaces the temperature of a stored record, keeping its name.
    pub fn edit_temperature(&self, id: u64, temperature: Option<f64>) -> Result<Record, ClientError> {
        let current = self.get(id)?;
        let draft = RecordDraft::new(&current.city_name, temperature)?;
        self.update(id, &draft)
    }

    /// CSV export rendered by the service.
    pub fn export_csv(&self) -> Result<String, ClientError> {
        let response = self.execute(ApiRequest::new(Method::Get, EXPORT_CSV_PATH))?;
        Ok(response.body)
    }
}
