//! Currencycloud Client Library
//!
//! Client for the rate lookup endpoints of the Currencycloud v2 API.
//!
//! # Example
//!
//! ```rust,ignore
//! use currencycloud_client::{ClientConfig, CurrencyCloud, RateQuoteParams};
//! use currencycloud_common::FixedSide;
//!
//! let client = CurrencyCloud::new(ClientConfig::from_env()?)?;
//! client.login().await?;
//!
//! let params = RateQuoteParams::new()
//!     .buy_currency("EUR")
//!     .sell_currency("GBP")
//!     .fixed_side(FixedSide::Buy)
//!     .amount(6700);
//!
//! // Parameter errors surface here, before any request is sent...
//! let pending = client.rates().get(&params)?;
//! // ...remote failures surface here.
//! let quote = pending.await?;
//!
//! client.logout().await?;
//! ```

pub mod client;
pub mod config;
pub mod models;
pub mod rates;
pub mod session;
pub mod transport;

pub use client::{CurrencyCloud, CurrencyCloudBuilder};
pub use config::{ClientConfig, Environment};
pub use models::{FoundRates, PairRate, RateQuote};
pub use rates::{FindRatesParams, RateQuoteParams, Rates};
pub use transport::{HttpTransport, RecordedTransport, Transport};
