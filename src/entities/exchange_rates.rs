//! `SeaORM` Entity for exchange_rates table
//!
//! One row per conversion that reached the rate provider and got a usable
//! rate table back. Rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub base_currency: String,
    pub target_currency: String,
    /// 0.0 when the target currency was missing from the rate table
    pub exchange_rate: f64,
    pub amount: f64,
    pub converted_amount: f64,
    #[sea_orm(column_type = "JsonBinary")]
    pub full_response: Json,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
