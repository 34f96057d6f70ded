use chrono::Utc;
use exchange_backend::{
    AppState,
    entities::exchange_rates,
    services::{conversion::ConversionService, exchange_rate_api::ExchangeRateApiService},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Transaction};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-api-key";

/// Mock rate provider answering `/{key}/latest/{base}` once per expected call
pub async fn mock_provider(base: &str, status: u16, body: Value, expected_calls: u64) -> MockServer {
    let mock_server = MockServer::start().await;
    let url_path = format!("/{}/latest/{}", TEST_API_KEY, base);

    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(expected_calls)
        .mount(&mock_server)
        .await;

    mock_server
}

pub fn usd_rates() -> Value {
    json!({
        "result": "success",
        "base_code": "USD",
        "time_last_update_unix": 1760745601,
        "conversion_rates": {
            "USD": 1,
            "EUR": 0.92,
            "PKR": 280.5
        }
    })
}

/// Row the mock database hands back for an INSERT ... RETURNING
pub fn stored_record(id: i32, base: &str, target: &str, rate: f64, amount: f64, converted: f64) -> exchange_rates::Model {
    exchange_rates::Model {
        id,
        base_currency: base.to_string(),
        target_currency: target.to_string(),
        exchange_rate: rate,
        amount,
        converted_amount: converted,
        full_response: json!({"result": "success", "conversion_rates": {}}),
        created_at: Utc::now().fixed_offset(),
    }
}

pub fn mock_db(rows: Vec<Vec<exchange_rates::Model>>) -> Arc<DatabaseConnection> {
    Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(rows)
            .into_connection(),
    )
}

/// Statements the mock saw. Every router and state built from `db` must be
/// dropped first so this is the last handle.
pub fn transaction_log(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    Arc::try_unwrap(db)
        .unwrap_or_else(|_| panic!("database connection still shared"))
        .into_transaction_log()
}

pub fn test_state(db: Arc<DatabaseConnection>, api_key: Option<&str>, provider_url: &str) -> AppState {
    let exchange_rate_api = ExchangeRateApiService::new(
        api_key.map(String::from),
        provider_url,
        Duration::from_secs(5),
    )
    .expect("Failed to build rate provider client");

    AppState {
        conversion: ConversionService::new(db.clone(), exchange_rate_api),
        db,
    }
}
