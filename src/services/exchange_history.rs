use chrono::{DateTime, FixedOffset};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{exchange_rates, prelude::*};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const MAX_HISTORY_LIMIT: u64 = 500;

/// Read-side filters over stored conversions
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub base: Option<String>,
    pub target: Option<String>,
    /// Substring match against either currency code
    pub search: Option<String>,
    pub since: Option<DateTime<FixedOffset>>,
    pub limit: Option<u64>,
}

impl HistoryFilter {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

/// Newest conversions first
pub async fn list_conversions(
    db: &DatabaseConnection,
    filter: &HistoryFilter,
) -> Result<Vec<exchange_rates::Model>, DbErr> {
    let mut query = ExchangeRates::find();

    if let Some(base) = non_empty(&filter.base) {
        query = query.filter(exchange_rates::Column::BaseCurrency.eq(base));
    }
    if let Some(target) = non_empty(&filter.target) {
        query = query.filter(exchange_rates::Column::TargetCurrency.eq(target));
    }
    if let Some(search) = non_empty(&filter.search) {
        query = query.filter(
            Condition::any()
                .add(exchange_rates::Column::BaseCurrency.contains(search))
                .add(exchange_rates::Column::TargetCurrency.contains(search)),
        );
    }
    if let Some(since) = filter.since {
        query = query.filter(exchange_rates::Column::CreatedAt.gte(since));
    }

    query
        .order_by_desc(exchange_rates::Column::CreatedAt)
        .order_by_desc(exchange_rates::Column::Id)
        .limit(filter.effective_limit())
        .all(db)
        .await
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
