//! Migration to create the exchange_rates table holding one row per conversion

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExchangeRates::Table)
                    .if_not_exists()
                    .col(pk_auto(ExchangeRates::Id))
                    .col(string_len(ExchangeRates::BaseCurrency, 10))
                    .col(string_len(ExchangeRates::TargetCurrency, 10))
                    .col(double(ExchangeRates::ExchangeRate))
                    .col(double(ExchangeRates::Amount).default(1.0))
                    .col(double(ExchangeRates::ConvertedAmount).default(0.0))
                    .col(json_binary(ExchangeRates::FullResponse))
                    .col(
                        timestamp_with_time_zone(ExchangeRates::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // History filters by currency pair
        manager
            .create_index(
                Index::create()
                    .name("idx_exchange_rates_pair")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::BaseCurrency)
                    .col(ExchangeRates::TargetCurrency)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_exchange_rates_created_at")
                    .table(ExchangeRates::Table)
                    .col(ExchangeRates::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExchangeRates {
    Table,
    Id,
    BaseCurrency,
    TargetCurrency,
    ExchangeRate,
    Amount,
    ConvertedAmount,
    FullResponse,
    CreatedAt,
}
