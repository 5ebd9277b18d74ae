use std::{cell::RefCell, collections::VecDeque};

use citytemp::{
    client::{
        ApiClient, ApiRequest, ApiResponse, ClientError, Method, SaveOutcome, Transport,
        TransportError,
    },
    record::RecordError,
    summarize,
};
use serde_json::{json, Value};

/// Answers requests from a queue of canned responses and remembers what it
/// was sent.
#[derive(Default)]
struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    fn reply(self, status: u16, body: Value) -> Self {
        self.responses.borrow_mut().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    fn reply_text(self, status: u16, body: &str) -> Self {
        self.responses.borrow_mut().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Err(TransportError(message.to_string())));
        self
    }

    fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request {request:?}"))
    }
}

fn record_json(id: u64, city: &str, temperature: Value) -> Value {
    json!({
        "id": id,
        "city_name": city,
        "temperature": temperature,
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": format!("2024-05-0{id}T12:00:00Z"),
    })
}

fn query(request: &ApiRequest) -> Vec<(&str, &str)> {
    request
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}

#[test]
fn list_decodes_records_and_passes_search() {
    let transport = ScriptedTransport::default().reply(
        200,
        json!([
            record_json(2, "Le Vigan", json!(18.5)),
            record_json(1, "Vigan", Value::Null),
        ]),
    );
    let client = ApiClient::new(transport);

    let records = client.list(Some("  vigan ")).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].temperature, Some(18.5));
    assert_eq!(records[1].temperature, None);

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path, "/api/citytemps/");
    assert_eq!(query(&requests[0]), vec![("search", "vigan")]);
}

#[test]
fn list_without_search_sends_no_query() {
    let client = ApiClient::new(ScriptedTransport::default().reply(200, json!([])));

    assert!(client.list(None).unwrap().is_empty());
    assert!(client.transport().requests()[0].query.is_empty());
}

#[test]
fn listed_records_feed_the_summary() {
    let client = ApiClient::new(ScriptedTransport::default().reply(
        200,
        json!([
            record_json(1, "Alès", json!(24)),
            record_json(2, "Ganges", json!(18.5)),
            record_json(3, "Aumessas", Value::Null),
        ]),
    ));

    let summary = summarize(&client.list(None).unwrap()).unwrap();
    assert_eq!(summary.total_records, 3);
    assert_eq!(summary.valid_count, 2);
    let stats = summary.stats.unwrap();
    assert_eq!(stats.average, 21.25);
    assert_eq!(stats.hottest_city.as_deref(), Some("Alès"));
    assert_eq!(stats.coldest_city.as_deref(), Some("Ganges"));
}

#[test]
fn malformed_temperature_surfaces_as_invalid_record() {
    let client = ApiClient::new(ScriptedTransport::default().reply(
        200,
        json!([record_json(1, "Alès", json!(24)), record_json(4, "Ganges", json!("warm"))]),
    ));

    let err = client.list(None).unwrap_err();
    assert!(
        matches!(err, ClientError::Record(RecordError::InvalidRecord { id: 4, .. })),
        "{err:?}"
    );
}

#[test]
fn save_updates_a_case_insensitive_match() {
    let transport = ScriptedTransport::default()
        .reply(
            200,
            json!([
                record_json(1, "Le Vigan Haut", json!(10)),
                record_json(2, "le vigan", json!(11)),
            ]),
        )
        .reply(200, record_json(2, "Le Vigan", json!(12.5)));
    let client = ApiClient::new(transport);

    let outcome = client.save(" Le Vigan ", Some(12.5)).unwrap();
    assert!(matches!(outcome, SaveOutcome::Updated(_)));
    assert_eq!(outcome.record().id, 2);

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(query(&requests[0]), vec![("search", "Le Vigan")]);
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(requests[1].path, "/api/citytemps/2/");
    assert_eq!(
        requests[1].body,
        Some(json!({ "city_name": "Le Vigan", "temperature": 12.5 }))
    );
}

#[test]
fn save_creates_when_no_exact_match() {
    let transport = ScriptedTransport::default()
        .reply(200, json!([record_json(1, "Le Vigan Haut", json!(10))]))
        .reply(201, record_json(3, "Le Vigan", Value::Null));
    let client = ApiClient::new(transport);

    let outcome = client.save("Le Vigan", None).unwrap();
    assert!(matches!(outcome, SaveOutcome::Created(_)));

    let requests = client.transport().requests();
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(requests[1].path, "/api/citytemps/");
    assert_eq!(
        requests[1].body,
        Some(json!({ "city_name": "Le Vigan", "temperature": null }))
    );
}

#[test]
fn save_rejects_a_blank_city_without_a_request() {
    let client = ApiClient::new(ScriptedTransport::default());

    let err = client.save("   ", Some(1.0)).unwrap_err();
    assert!(matches!(err, ClientError::Record(RecordError::EmptyCityName)));
    assert!(client.transport().requests().is_empty());
}

#[test]
fn suggest_skips_blank_input() {
    let client = ApiClient::new(ScriptedTransport::default());

    assert!(client.suggest("  ").unwrap().is_empty());
    assert!(client.transport().requests().is_empty());
}

#[test]
fn suggest_queries_by_name() {
    let client = ApiClient::new(
        ScriptedTransport::default().reply(200, json!([record_json(1, "Montpellier", json!(22))])),
    );

    let suggestions = client.suggest("mont").unwrap();
    assert_eq!(suggestions[0].city_name, "Montpellier");

    let requests = client.transport().requests();
    let request = &requests[0];
    assert_eq!(request.path, "/api/citytemps/by_city/");
    assert_eq!(query(request), vec![("name", "mont")]);
}

#[test]
fn edit_keeps_the_city_name() {
    let transport = ScriptedTransport::default()
        .reply(200, record_json(5, "Nîmes", json!(30)))
        .reply(200, record_json(5, "Nîmes", Value::Null));
    let client = ApiClient::new(transport);

    let record = client.edit_temperature(5, None).unwrap();
    assert_eq!(record.temperature, None);

    let requests = client.transport().requests();
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].path, "/api/citytemps/5/");
    assert_eq!(requests[1].method, Method::Put);
    assert_eq!(
        requests[1].body,
        Some(json!({ "city_name": "Nîmes", "temperature": null }))
    );
}

#[test]
fn delete_accepts_an_empty_body() {
    let client = ApiClient::new(ScriptedTransport::default().reply_text(204, ""));

    client.delete(9).unwrap();
    let requests = client.transport().requests();
    let request = &requests[0];
    assert_eq!(request.method, Method::Delete);
    assert_eq!(request.path, "/api/citytemps/9/");
}

#[test]
fn missing_record_is_not_found() {
    let client = ApiClient::new(
        ScriptedTransport::default().reply(404, json!({ "detail": "No CityTemp matches the given query." })),
    );

    let err = client.get(77).unwrap_err();
    assert!(matches!(err, ClientError::NotFound { ref path } if path == "/api/citytemps/77/"));
}

#[test]
fn fetch_weather_decodes_the_reading() {
    let client = ApiClient::new(ScriptedTransport::default().reply(
        200,
        json!({
            "city_name": "Montpellier",
            "temperature": 23.4,
            "created": false,
            "id": 8,
            "raw": { "description": "clear sky", "humidity": 40, "pressure": 1016 },
        }),
    ));

    let fetched = client.fetch_weather(" Montpellier ").unwrap();
    assert_eq!(fetched.id, 8);
    assert_eq!(fetched.temperature, Some(23.4));
    assert!(!fetched.created);
    assert_eq!(fetched.raw.description, "clear sky");
    assert_eq!(fetched.raw.humidity, Some(40.0));

    let requests = client.transport().requests();
    let request = &requests[0];
    assert_eq!(request.path, "/fetch_weather/");
    assert_eq!(query(request), vec![("city", "Montpellier")]);
}

#[test]
fn fetch_weather_reports_service_errors() {
    let client = ApiClient::new(ScriptedTransport::default().reply(
        502,
        json!({ "error": "City \"Atlantis\" not found", "details": "404 Client Error", "status_code": 404 }),
    ));

    let err = client.fetch_weather("Atlantis").unwrap_err();
    match err {
        ClientError::Service { status, message } => {
            assert_eq!(status, 502);
            assert_eq!(message, "City \"Atlantis\" not found (404 Client Error)");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn fetch_weather_rejects_a_blank_city() {
    let client = ApiClient::new(ScriptedTransport::default());
    assert!(client.fetch_weather("").is_err());
    assert!(client.transport().requests().is_empty());
}

#[test]
fn transport_failures_propagate() {
    let client = ApiClient::new(ScriptedTransport::default().fail("connection refused"));

    let err = client.list(None).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn garbage_body_is_a_decode_error() {
    let client = ApiClient::new(ScriptedTransport::default().reply_text(200, "<html>oops</html>"));

    let err = client.list(None).unwrap_err();
    assert!(matches!(err, ClientError::Decode { ref path, .. } if path == "/api/citytemps/"));
}

#[test]
fn remote_export_returns_the_body() {
    let csv = "ID,City Name,Temperature (°C),Created At,Updated At\r\n1,Alès,24.0,2024-05-01 08:00:00,2024-05-01 12:00:00\r\n";
    let client = ApiClient::new(ScriptedTransport::default().reply_text(200, csv));

    assert_eq!(client.export_csv().unwrap(), csv);
    assert_eq!(client.transport().requests()[0].path, "/export_csv/");
}
