use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::DateTime;

use crate::{
    AppState,
    models::exchange::{
        DEFAULT_BASE_CURRENCY, DEFAULT_TARGET_CURRENCY, ErrorResponse, ExchangeErrorResponse,
        ExchangeHistoryQuery, ExchangeHistoryResponse, ExchangeRecord, ExchangeRequest,
        ExchangeResponse,
    },
    services::{
        conversion::{ConversionError, ConversionRequest},
        exchange_history::{self, HistoryFilter},
    },
};

/// Handler for POST /exchange/
///
/// The body is parsed by hand so an empty body falls back to the defaults
/// (USD -> PKR, amount 1) and every malformed payload gets the same 400 shape.
pub async fn convert_currency(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(err) => return conversion_error_response(err),
    };

    let base = payload
        .base
        .unwrap_or_else(|| DEFAULT_BASE_CURRENCY.to_string());
    let target = payload
        .target
        .unwrap_or_else(|| DEFAULT_TARGET_CURRENCY.to_string());

    let request = match ConversionRequest::new(base, target, payload.amount.as_ref()) {
        Ok(request) => request,
        Err(err) => return conversion_error_response(err),
    };

    tracing::debug!(
        "Converting {} {} -> {}",
        request.amount,
        request.base,
        request.target
    );

    match state.conversion.convert(request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ExchangeResponse {
                status: "success".to_string(),
                base_currency: outcome.base,
                target_currency: outcome.target,
                exchange_rate: outcome.exchange_rate,
                amount: outcome.amount,
                converted_amount: outcome.converted_amount,
                full_api_response: outcome.full_response,
                record_id: outcome.record.id,
            }),
        )
            .into_response(),
        Err(err) => conversion_error_response(err),
    }
}

fn parse_payload(body: &[u8]) -> Result<ExchangeRequest, ConversionError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ExchangeRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| ConversionError::Validation(format!("Invalid request body: {}", e)))
}

fn conversion_error_response(err: ConversionError) -> Response {
    match err {
        ConversionError::Validation(message) => {
            tracing::debug!("Rejected conversion request: {}", message);
            (StatusCode::BAD_REQUEST, Json(ExchangeErrorResponse::new(message))).into_response()
        }
        ConversionError::Configuration(message) => {
            tracing::error!("Conversion unavailable: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: message }),
            )
                .into_response()
        }
        ConversionError::Upstream(message) => {
            tracing::error!("Rate provider call failed: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExchangeErrorResponse::new(message)),
            )
                .into_response()
        }
        ConversionError::UpstreamRejection {
            message,
            api_response,
        } => (
            StatusCode::BAD_REQUEST,
            Json(ExchangeErrorResponse::with_api_response(message, api_response)),
        )
            .into_response(),
        err @ ConversionError::Persistence(_) => {
            tracing::error!("Failed to store conversion: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExchangeErrorResponse::new(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Handler for GET /exchange/history
pub async fn get_exchange_history(
    State(state): State<AppState>,
    Query(query): Query<ExchangeHistoryQuery>,
) -> Result<Json<ExchangeHistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let since = match query.since.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(DateTime::parse_from_rfc3339(raw).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid 'since' timestamp '{}': {}", raw, e),
                }),
            )
        })?),
        None => None,
    };

    let filter = HistoryFilter {
        base: query.base,
        target: query.target,
        search: query.search,
        since,
        limit: query.limit,
    };

    let records = exchange_history::list_conversions(&*state.db, &filter)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load conversion history: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Database error: {}", e),
                }),
            )
        })?;

    let records: Vec<ExchangeRecord> = records.into_iter().map(ExchangeRecord::from).collect();

    Ok(Json(ExchangeHistoryResponse {
        count: records.len(),
        records,
    }))
}
