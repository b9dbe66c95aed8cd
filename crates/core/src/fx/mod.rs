//! FX (Foreign Exchange) module - rate storage, lookup, and conversion.

pub mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_service;

pub use currency_converter::CurrencyConverter;
pub use fx_errors::FxError;
pub use fx_model::ExchangeRate;
pub use fx_service::FxService;

#[cfg(test)]
mod fx_service_tests;
