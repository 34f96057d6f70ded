use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::exchange_rates;

pub const DEFAULT_BASE_CURRENCY: &str = "USD";
pub const DEFAULT_TARGET_CURRENCY: &str = "PKR";

/// Body for POST /exchange/
///
/// `amount` stays an untyped JSON value so both `250` and `"250"` are
/// accepted; parsing happens in the conversion service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeRequest {
    pub base: Option<String>,
    pub target: Option<String>,
    pub amount: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    pub status: String, // Always "success"
    pub base_currency: String,
    pub target_currency: String,
    pub exchange_rate: Option<f64>,    // null when the target is not in the rate table
    pub amount: f64,
    pub converted_amount: Option<f64>, // null when the target is not in the rate table
    pub full_api_response: Value,
    pub record_id: i32,
}

/// 400/500 body for faults reported with a status field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeErrorResponse {
    pub status: String, // Always "error"
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_response: Option<Value>,
}

impl ExchangeErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            api_response: None,
        }
    }

    pub fn with_api_response(message: impl Into<String>, api_response: Value) -> Self {
        Self {
            api_response: Some(api_response),
            ..Self::new(message)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Query parameters for GET /exchange/history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeHistoryQuery {
    pub base: Option<String>,
    pub target: Option<String>,
    pub search: Option<String>,
    pub since: Option<String>, // RFC 3339
    pub limit: Option<u64>,    // Default 50, clamped to 1..=500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub id: i32,
    pub base_currency: String,
    pub target_currency: String,
    pub exchange_rate: f64,
    pub amount: f64,
    pub converted_amount: f64,
    pub full_response: Value,
    pub created_at: String,
}

impl From<exchange_rates::Model> for ExchangeRecord {
    fn from(model: exchange_rates::Model) -> Self {
        Self {
            id: model.id,
            base_currency: model.base_currency,
            target_currency: model.target_currency,
            exchange_rate: model.exchange_rate,
            amount: model.amount,
            converted_amount: model.converted_amount,
            full_response: model.full_response,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeHistoryResponse {
    pub records: Vec<ExchangeRecord>,
    pub count: usize,
}
