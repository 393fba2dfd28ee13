//! Rate lookups: detailed quotes and indicative pair rates.
//!
//! Both operations validate their parameters synchronously and only then
//! hand back a future that performs the request. Missing or malformed input
//! is reported by the outer `Result`; anything that goes wrong on the wire is
//! reported by the future.

use chrono::NaiveDate;
use currencycloud_common::{
    ContactId, ConversionDatePreference, Currency, CurrencyCloudError, CurrencyPair, FixedSide,
    Result,
};
use futures::future::{BoxFuture, FutureExt};
use rust_decimal::Decimal;
use tracing::{info, info_span, Instrument};

use crate::client::CurrencyCloud;
use crate::models::{FoundRates, RateQuote};
use crate::transport::ApiRequest;

const DETAILED_PATH: &str = "/v2/rates/detailed";
const FIND_PATH: &str = "/v2/rates/find";

const GET_OPERATION: &str = "rates.get";
const FIND_OPERATION: &str = "rates.find";

/// Parameters for a detailed quote.
///
/// `buy_currency`, `sell_currency`, `fixed_side` and `amount` are required.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateQuoteParams {
    pub buy_currency: Option<String>,
    pub sell_currency: Option<String>,
    pub fixed_side: Option<FixedSide>,
    pub amount: Option<Decimal>,
    pub conversion_date: Option<NaiveDate>,
    pub conversion_date_preference: Option<ConversionDatePreference>,
    pub on_behalf_of: Option<ContactId>,
}

impl RateQuoteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buy_currency(mut self, code: impl Into<String>) -> Self {
        self.buy_currency = Some(code.into());
        self
    }

    pub fn sell_currency(mut self, code: impl Into<String>) -> Self {
        self.sell_currency = Some(code.into());
        self
    }

    pub fn fixed_side(mut self, side: FixedSide) -> Self {
        self.fixed_side = Some(side);
        self
    }

    pub fn amount(mut self, amount: impl Into<Decimal>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn conversion_date(mut self, date: NaiveDate) -> Self {
        self.conversion_date = Some(date);
        self
    }

    pub fn conversion_date_preference(mut self, preference: ConversionDatePreference) -> Self {
        self.conversion_date_preference = Some(preference);
        self
    }

    pub fn on_behalf_of(mut self, contact: ContactId) -> Self {
        self.on_behalf_of = Some(contact);
        self
    }

    /// Check presence first, then shape.
    fn validate(&self) -> Result<DetailedRateRequest> {
        let buy_currency = require(GET_OPERATION, "buy_currency", self.buy_currency.as_deref())?;
        let sell_currency = require(GET_OPERATION, "sell_currency", self.sell_currency.as_deref())?;
        let fixed_side = require(GET_OPERATION, "fixed_side", self.fixed_side)?;
        let amount = require(GET_OPERATION, "amount", self.amount)?;

        let buy_currency = parse_currency("buy_currency", buy_currency)?;
        let sell_currency = parse_currency("sell_currency", sell_currency)?;

        if amount <= Decimal::ZERO {
            return Err(CurrencyCloudError::InvalidParameter {
                parameter: "amount",
                message: format!("must be positive, got {}", amount),
            });
        }

        Ok(DetailedRateRequest {
            buy_currency,
            sell_currency,
            fixed_side,
            amount,
            conversion_date: self.conversion_date,
            conversion_date_preference: self.conversion_date_preference,
            on_behalf_of: self.on_behalf_of,
        })
    }
}

/// Parameters for indicative rates of one or more pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindRatesParams {
    /// Pairs in `USDGBP` notation. At least one is required.
    pub currency_pairs: Vec<String>,
    pub ignore_invalid_pairs: Option<bool>,
    pub on_behalf_of: Option<ContactId>,
}

impl FindRatesParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn currency_pair(mut self, pair: impl Into<String>) -> Self {
        self.currency_pairs.push(pair.into());
        self
    }

    pub fn ignore_invalid_pairs(mut self, ignore: bool) -> Self {
        self.ignore_invalid_pairs = Some(ignore);
        self
    }

    pub fn on_behalf_of(mut self, contact: ContactId) -> Self {
        self.on_behalf_of = Some(contact);
        self
    }

    fn validate(&self) -> Result<FindRatesRequest> {
        if self.currency_pairs.is_empty() {
            return Err(CurrencyCloudError::MissingParameter {
                operation: FIND_OPERATION,
                parameter: "currency_pair",
            });
        }

        let currency_pairs = self
            .currency_pairs
            .iter()
            .map(|pair| {
                pair.parse::<CurrencyPair>()
                    .map_err(|e| CurrencyCloudError::InvalidParameter {
                        parameter: "currency_pair",
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FindRatesRequest {
            currency_pairs,
            ignore_invalid_pairs: self.ignore_invalid_pairs,
            on_behalf_of: self.on_behalf_of,
        })
    }
}

fn require<T>(operation: &'static str, parameter: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(CurrencyCloudError::MissingParameter {
        operation,
        parameter,
    })
}

fn parse_currency(parameter: &'static str, code: &str) -> Result<Currency> {
    Currency::parse(code).map_err(|e| CurrencyCloudError::InvalidParameter {
        parameter,
        message: e.to_string(),
    })
}

/// Validated detailed-rate request.
#[derive(Debug, Clone)]
struct DetailedRateRequest {
    buy_currency: Currency,
    sell_currency: Currency,
    fixed_side: FixedSide,
    amount: Decimal,
    conversion_date: Option<NaiveDate>,
    conversion_date_preference: Option<ConversionDatePreference>,
    on_behalf_of: Option<ContactId>,
}

impl DetailedRateRequest {
    fn into_api_request(self) -> ApiRequest {
        ApiRequest::get(DETAILED_PATH)
            .param("buy_currency", &self.buy_currency)
            .param("sell_currency", &self.sell_currency)
            .param("fixed_side", self.fixed_side)
            .param("amount", self.amount)
            .optional_param(
                "conversion_date",
                self.conversion_date.map(|d| d.format("%Y-%m-%d")),
            )
            .optional_param("conversion_date_preference", self.conversion_date_preference)
            .optional_param("on_behalf_of", self.on_behalf_of)
    }
}

/// Validated find request.
#[derive(Debug, Clone)]
struct FindRatesRequest {
    currency_pairs: Vec<CurrencyPair>,
    ignore_invalid_pairs: Option<bool>,
    on_behalf_of: Option<ContactId>,
}

impl FindRatesRequest {
    fn pairs_param(&self) -> String {
        self.currency_pairs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn into_api_request(self) -> ApiRequest {
        ApiRequest::get(FIND_PATH)
            .param("currency_pair", self.pairs_param())
            .optional_param("ignore_invalid_pairs", self.ignore_invalid_pairs)
            .optional_param("on_behalf_of", self.on_behalf_of)
    }
}

/// Rate lookup operations, obtained from [`CurrencyCloud::rates`].
#[derive(Clone, Copy)]
pub struct Rates<'a> {
    client: &'a CurrencyCloud,
}

impl<'a> Rates<'a> {
    pub(crate) fn new(client: &'a CurrencyCloud) -> Self {
        Self { client }
    }

    /// Request a detailed quote.
    ///
    /// Returns `Err` immediately, without any I/O, when a required parameter
    /// is missing or malformed. Otherwise the returned future performs one
    /// `GET /v2/rates/detailed` call.
    pub fn get(&self, params: &RateQuoteParams) -> Result<BoxFuture<'a, Result<RateQuote>>> {
        let request = params.validate()?;
        let client = self.client;

        let span = info_span!(
            "rates.get",
            buy_currency = %request.buy_currency,
            sell_currency = %request.sell_currency,
            fixed_side = %request.fixed_side,
            amount = %request.amount,
        );

        Ok(async move {
            let quote: RateQuote = client.execute(request.into_api_request()).await?;
            info!(
                pair = %quote.currency_pair,
                client_rate = %quote.client_rate,
                settlement_cut_off_time = %quote.settlement_cut_off_time,
                "Quote received"
            );
            Ok(quote)
        }
        .instrument(span)
        .boxed())
    }

    /// Request indicative rates for one or more currency pairs.
    ///
    /// Returns `Err` immediately when no pair was given or a pair is
    /// malformed. Otherwise the returned future performs one
    /// `GET /v2/rates/find` call.
    pub fn find(&self, params: &FindRatesParams) -> Result<BoxFuture<'a, Result<FoundRates>>> {
        let request = params.validate()?;
        let client = self.client;

        let span = info_span!("rates.find", pairs = %request.pairs_param());

        Ok(async move {
            let found: FoundRates = client.execute(request.into_api_request()).await?;
            info!(
                rates = found.rates.len(),
                unavailable = found.unavailable.len(),
                "Rates found"
            );
            Ok(found)
        }
        .instrument(span)
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn complete_params() -> RateQuoteParams {
        RateQuoteParams::new()
            .buy_currency("EUR")
            .sell_currency("GBP")
            .fixed_side(FixedSide::Buy)
            .amount(dec!(6700))
    }

    fn missing_parameter(err: CurrencyCloudError) -> &'static str {
        match err {
            CurrencyCloudError::MissingParameter { parameter, .. } => parameter,
            other => panic!("expected missing parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let mut params = complete_params();
        params.buy_currency = None;
        assert_eq!(missing_parameter(params.validate().unwrap_err()), "buy_currency");

        let mut params = complete_params();
        params.sell_currency = None;
        assert_eq!(missing_parameter(params.validate().unwrap_err()), "sell_currency");

        let mut params = complete_params();
        params.fixed_side = None;
        assert_eq!(missing_parameter(params.validate().unwrap_err()), "fixed_side");

        let mut params = complete_params();
        params.amount = None;
        assert_eq!(missing_parameter(params.validate().unwrap_err()), "amount");
    }

    #[test]
    fn test_detailed_request_params() {
        let request = complete_params()
            .conversion_date_preference(ConversionDatePreference::OptimizeLiquidity)
            .conversion_date(NaiveDate::from_ymd_opt(2020, 5, 21).unwrap())
            .validate()
            .unwrap()
            .into_api_request();

        assert_eq!(request.request_line(), "GET /v2/rates/detailed");
        assert_eq!(request.params["buy_currency"], "EUR");
        assert_eq!(request.params["sell_currency"], "GBP");
        assert_eq!(request.params["fixed_side"], "buy");
        assert_eq!(request.params["amount"], "6700");
        assert_eq!(request.params["conversion_date"], "2020-05-21");
        assert_eq!(request.params["conversion_date_preference"], "optimize_liquidity");
        assert!(!request.params.contains_key("on_behalf_of"));
    }

    #[test]
    fn test_currency_codes_are_normalised() {
        let request = complete_params().buy_currency("eur").validate().unwrap();
        assert_eq!(request.buy_currency, Currency::eur());
    }

    #[test]
    fn test_malformed_input_is_invalid() {
        let err = complete_params().sell_currency("POUNDS").validate().unwrap_err();
        assert!(matches!(
            err,
            CurrencyCloudError::InvalidParameter { parameter: "sell_currency", .. }
        ));

        let err = complete_params().amount(dec!(0)).validate().unwrap_err();
        assert!(matches!(err, CurrencyCloudError::InvalidParameter { parameter: "amount", .. }));
    }

    #[test]
    fn test_find_requires_a_pair() {
        let err = FindRatesParams::new().validate().unwrap_err();
        assert_eq!(missing_parameter(err), "currency_pair");
    }

    #[test]
    fn test_find_request_joins_pairs() {
        let request = FindRatesParams::new()
            .currency_pair("USDGBP")
            .currency_pair("eurusd")
            .ignore_invalid_pairs(true)
            .validate()
            .unwrap()
            .into_api_request();

        assert_eq!(request.params["currency_pair"], "USDGBP,EURUSD");
        assert_eq!(request.params["ignore_invalid_pairs"], "true");
    }

    #[test]
    fn test_find_rejects_malformed_pair() {
        let err = FindRatesParams::new().currency_pair("USD-GBP").validate().unwrap_err();
        assert!(err.is_invalid_parameters());
    }

    proptest! {
        #[test]
        fn prop_any_single_missing_field_fails(
            buy in "[A-Z]{3}",
            sell in "[A-Z]{3}",
            buy_side in any::<bool>(),
            amount in 1u64..10_000_000,
            omitted in 0usize..4,
        ) {
            let mut params = RateQuoteParams::new()
                .buy_currency(buy)
                .sell_currency(sell)
                .fixed_side(if buy_side { FixedSide::Buy } else { FixedSide::Sell })
                .amount(Decimal::from(amount));
            prop_assert!(params.validate().is_ok());

            match omitted {
                0 => params.buy_currency = None,
                1 => params.sell_currency = None,
                2 => params.fixed_side = None,
                _ => params.amount = None,
            }

            let err = params.validate().unwrap_err();
            prop_assert!(
                matches!(err, CurrencyCloudError::MissingParameter { operation: "rates.get", .. }),
                "unexpected error: {:?}",
                err
            );
        }
    }
}
