//! Response models for the rates endpoints.

use std::fmt;

use chrono::{DateTime, Utc};
use currencycloud_common::{Currency, CurrencyPair, FixedSide};
use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A detailed quote returned by `GET /v2/rates/detailed`.
///
/// Amounts keep the scale sent by the API, so `"14081.00"` renders back as
/// `14081.00`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Deadline for settlement at the quoted rate.
    pub settlement_cut_off_time: DateTime<Utc>,
    pub currency_pair: CurrencyPair,
    pub client_buy_currency: Currency,
    pub client_sell_currency: Currency,
    pub client_buy_amount: Decimal,
    pub client_sell_amount: Decimal,
    pub fixed_side: FixedSide,
    /// Rate offered to the client, in `currency_pair` terms.
    pub client_rate: Decimal,
    #[serde(default)]
    pub partner_rate: Option<Decimal>,
    pub core_rate: Decimal,
    #[serde(default)]
    pub deposit_required: bool,
    #[serde(default)]
    pub deposit_amount: Decimal,
    #[serde(default)]
    pub deposit_currency: Option<Currency>,
    #[serde(default)]
    pub mid_market_rate: Option<Decimal>,
    #[serde(default)]
    pub conversion_date: Option<DateTime<Utc>>,
}

impl RateQuote {
    /// Amount on the fixed side of the quote.
    pub fn fixed_amount(&self) -> Decimal {
        match self.fixed_side {
            FixedSide::Buy => self.client_buy_amount,
            FixedSide::Sell => self.client_sell_amount,
        }
    }
}

/// Indicative bid/offer for one currency pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRate {
    pub currency_pair: CurrencyPair,
    pub bid: Decimal,
    pub offer: Decimal,
}

impl PairRate {
    /// Mid-market rate.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.offer) / Decimal::TWO
    }

    /// Spread in basis points of the mid rate.
    pub fn spread_bps(&self) -> Decimal {
        let mid = self.mid();
        if mid.is_zero() {
            return Decimal::ZERO;
        }
        ((self.offer - self.bid) / mid) * Decimal::from(10000)
    }
}

/// Result of `GET /v2/rates/find`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundRates {
    /// Rates in the order the API returned them.
    #[serde(
        serialize_with = "serialize_pair_rates",
        deserialize_with = "deserialize_pair_rates"
    )]
    pub rates: Vec<PairRate>,
    /// Pairs the API could not price.
    #[serde(default)]
    pub unavailable: Vec<String>,
}

impl FoundRates {
    /// Look up the rate for a pair.
    pub fn get(&self, pair: &CurrencyPair) -> Option<&PairRate> {
        self.rates.iter().find(|r| &r.currency_pair == pair)
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Written back in the API's `{"USDGBP": ["bid", "offer"], ...}` form.
fn serialize_pair_rates<S>(rates: &[PairRate], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(rates.len()))?;
    for rate in rates {
        map.serialize_entry(&rate.currency_pair, &(rate.bid, rate.offer))?;
    }
    map.end()
}

/// The API sends `{"USDGBP": ["bid", "offer"], ...}`.
fn deserialize_pair_rates<'de, D>(deserializer: D) -> Result<Vec<PairRate>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PairRatesVisitor;

    impl<'de> Visitor<'de> for PairRatesVisitor {
        type Value = Vec<PairRate>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of currency pair to [bid, offer]")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut rates = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((currency_pair, (bid, offer))) =
                map.next_entry::<CurrencyPair, (Decimal, Decimal)>()?
            {
                rates.push(PairRate {
                    currency_pair,
                    bid,
                    offer,
                });
            }
            Ok(rates)
        }
    }

    deserializer.deserialize_map(PairRatesVisitor)
}
