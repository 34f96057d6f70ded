pub use super::exchange_rates::Entity as ExchangeRates;
