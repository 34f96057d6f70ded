//! Currency conversion backed by the rate provider
//!
//! One provider call per conversion, never retried or cached. A record is
//! written only when the provider answered HTTP 200 with a non-empty rate
//! table, including the case where the requested target is missing from it.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::entities::exchange_rates;
use crate::services::exchange_rate_api::{ExchangeRateApiError, ExchangeRateApiService};

pub const DEFAULT_AMOUNT: f64 = 1.0;
const GENERIC_REJECTION: &str = "Unable to fetch exchange rate";

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{message}")]
    UpstreamRejection { message: String, api_response: Value },
    #[error("Database error: {0}")]
    Persistence(#[from] DbErr),
}

impl From<ExchangeRateApiError> for ConversionError {
    fn from(err: ExchangeRateApiError) -> Self {
        match err {
            ExchangeRateApiError::MissingApiKey => ConversionError::Configuration(err.to_string()),
            other => ConversionError::Upstream(other.to_string()),
        }
    }
}

/// Validated conversion input
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub base: String,
    pub target: String,
    pub amount: f64,
}

impl ConversionRequest {
    /// Currency codes are forwarded as given; only the amount is checked.
    pub fn new(base: String, target: String, amount: Option<&Value>) -> Result<Self, ConversionError> {
        Ok(Self {
            base,
            target,
            amount: parse_amount(amount)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub base: String,
    pub target: String,
    /// `None` when the target currency was not in the rate table
    pub exchange_rate: Option<f64>,
    pub amount: f64,
    pub converted_amount: Option<f64>,
    /// Provider payload with `conversion_rates` narrowed to the target
    pub full_response: Value,
    pub record: exchange_rates::Model,
}

#[derive(Clone)]
pub struct ConversionService {
    db: Arc<DatabaseConnection>,
    exchange_rate_api: ExchangeRateApiService,
}

impl ConversionService {
    pub fn new(db: Arc<DatabaseConnection>, exchange_rate_api: ExchangeRateApiService) -> Self {
        Self {
            db,
            exchange_rate_api,
        }
    }

    pub async fn convert(&self, request: ConversionRequest) -> Result<ConversionOutcome, ConversionError> {
        let provider = self.exchange_rate_api.fetch_latest(&request.base).await?;

        let rate_table = match provider.rate_table() {
            Some(table) if provider.is_ok() => table,
            _ => {
                let message = provider.error_type().unwrap_or(GENERIC_REJECTION).to_string();
                tracing::warn!(
                    "Rate provider rejected {} lookup (HTTP {}): {}",
                    request.base,
                    provider.status,
                    message
                );
                return Err(ConversionError::UpstreamRejection {
                    message,
                    api_response: provider.body.clone(),
                });
            }
        };

        let rate_entry = lookup_rate(rate_table, &request.target);
        let exchange_rate = rate_entry.map(|(_, rate)| rate);
        let converted_amount = match exchange_rate {
            Some(rate) => {
                let product = request.amount * rate;
                if !product.is_finite() {
                    return Err(ConversionError::Validation(format!(
                        "Converted amount out of range: {} x {}",
                        request.amount, rate
                    )));
                }
                Some(round_to_cents(product))
            }
            None => None,
        };

        if exchange_rate.is_none() {
            tracing::warn!(
                "Target currency {} not found in {} rate table",
                request.target,
                request.base
            );
        }

        let full_response = narrow_rate_table(
            &provider.body,
            &request.target,
            rate_entry.map(|(raw, _)| raw),
        );

        let record = exchange_rates::ActiveModel {
            base_currency: Set(request.base.clone()),
            target_currency: Set(request.target.clone()),
            exchange_rate: Set(exchange_rate.unwrap_or(0.0)),
            amount: Set(request.amount),
            converted_amount: Set(converted_amount.unwrap_or(0.0)),
            full_response: Set(full_response.clone()),
            created_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        tracing::info!(
            "Stored conversion #{}: {} {} -> {} @ {:?}",
            record.id,
            request.amount,
            request.base,
            request.target,
            exchange_rate
        );

        Ok(ConversionOutcome {
            base: request.base,
            target: request.target,
            exchange_rate,
            amount: request.amount,
            converted_amount,
            full_response,
            record,
        })
    }
}

/// Absent or null means the default of 1; numbers and numeric strings are accepted.
pub fn parse_amount(raw: Option<&Value>) -> Result<f64, ConversionError> {
    let parsed = match raw {
        None | Some(Value::Null) => return Ok(DEFAULT_AMOUNT),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    parsed.filter(|amount| amount.is_finite()).ok_or_else(|| {
        ConversionError::Validation(format!(
            "Invalid amount: {}",
            raw.map(Value::to_string).unwrap_or_default()
        ))
    })
}

/// Explicit key lookup: a present 0.0 rate is a real rate, a non-numeric entry is not.
fn lookup_rate<'a>(rate_table: &'a Map<String, Value>, target: &str) -> Option<(&'a Value, f64)> {
    let raw = rate_table.get(target)?;
    raw.as_f64().map(|rate| (raw, rate))
}

fn narrow_rate_table(body: &Value, target: &str, rate: Option<&Value>) -> Value {
    let mut table = Map::new();
    if let Some(rate) = rate {
        table.insert(target.to_string(), rate.clone());
    }

    let mut narrowed = body.clone();
    if let Some(obj) = narrowed.as_object_mut() {
        obj.insert("conversion_rates".to_string(), Value::Object(table));
    }
    narrowed
}

/// Round half to even at two decimal places, starting from the exact binary
/// value so 2.675 (stored as 2.67499...) goes down like Python's `round`.
pub fn round_to_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
