//! Currency and quote vocabulary shared by the Currencycloud client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ISO 4217 currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code without checking its shape.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Parse a currency code, requiring exactly three ASCII letters.
    pub fn parse(code: &str) -> Result<Self, ParseCurrencyError> {
        let code = code.trim();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self::new(code))
        } else {
            Err(ParseCurrencyError::new(code, "expected a three-letter ISO 4217 code"))
        }
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Common currencies
    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A currency pair in Currencycloud notation (`USDGBP`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CurrencyPair {
    /// Base currency.
    pub base: Currency,
    /// Quote currency.
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Get the inverse pair.
    pub fn inverse(&self) -> Self {
        Self {
            base: self.quote.clone(),
            quote: self.base.clone(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 6 || !s.is_ascii() {
            return Err(ParseCurrencyError::new(s, "expected a six-letter currency pair"));
        }
        let (base, quote) = s.split_at(3);
        Ok(Self::new(Currency::parse(base)?, Currency::parse(quote)?))
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = ParseCurrencyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Error returned when a currency code or pair is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCurrencyError {
    pub input: String,
    pub reason: &'static str,
}

impl ParseCurrencyError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl fmt::Display for ParseCurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseCurrencyError {}

/// Which leg of a conversion carries the caller's fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedSide {
    Buy,
    Sell,
}

impl FixedSide {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FixedSide::Buy => "buy",
            FixedSide::Sell => "sell",
        }
    }
}

impl fmt::Display for FixedSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixedSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(FixedSide::Buy),
            "sell" => Ok(FixedSide::Sell),
            other => Err(format!("unknown fixed side `{}`", other)),
        }
    }
}

/// Hint for which conversion date the server should select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDatePreference {
    /// Server default (next settlement date).
    Default,
    /// Earliest date the pair can settle.
    Earliest,
    /// Date with the best liquidity for the pair.
    OptimizeLiquidity,
}

impl ConversionDatePreference {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionDatePreference::Default => "default",
            ConversionDatePreference::Earliest => "earliest",
            ConversionDatePreference::OptimizeLiquidity => "optimize_liquidity",
        }
    }
}

impl fmt::Display for ConversionDatePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionDatePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "earliest" => Ok(Self::Earliest),
            "optimize_liquidity" => Ok(Self::OptimizeLiquidity),
            other => Err(format!("unknown conversion date preference `{}`", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("eur").unwrap(), Currency::eur());
        assert!(Currency::parse("EURO").is_err());
        assert!(Currency::parse("E1R").is_err());
        assert!(Currency::parse("").is_err());
    }

    #[test]
    fn test_currency_pair_notation() {
        let pair: CurrencyPair = "USDGBP".parse().unwrap();
        assert_eq!(pair.base, Currency::usd());
        assert_eq!(pair.quote, Currency::gbp());
        assert_eq!(pair.to_string(), "USDGBP");
        assert_eq!(pair.inverse().to_string(), "GBPUSD");
    }

    #[test]
    fn test_currency_pair_rejects_bad_length() {
        assert!("USDGB".parse::<CurrencyPair>().is_err());
        assert!("USD/GBP".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_currency_pair_serde_as_string() {
        let pair: CurrencyPair = serde_json::from_str("\"EURUSD\"").unwrap();
        assert_eq!(pair, CurrencyPair::new(Currency::eur(), Currency::usd()));
        assert_eq!(serde_json::to_string(&pair).unwrap(), "\"EURUSD\"");
    }

    #[test]
    fn test_fixed_side_wire_format() {
        assert_eq!(serde_json::to_string(&FixedSide::Buy).unwrap(), "\"buy\"");
        assert_eq!("Sell".parse::<FixedSide>().unwrap(), FixedSide::Sell);
        assert!("both".parse::<FixedSide>().is_err());
    }

    #[test]
    fn test_conversion_date_preference_wire_format() {
        let pref: ConversionDatePreference =
            serde_json::from_str("\"optimize_liquidity\"").unwrap();
        assert_eq!(pref, ConversionDatePreference::OptimizeLiquidity);
        assert_eq!(pref.as_str(), "optimize_liquidity");
    }

    proptest! {
        #[test]
        fn prop_three_letter_codes_parse(code in "[A-Za-z]{3}") {
            let currency = Currency::parse(&code).unwrap();
            prop_assert_eq!(currency.code(), code.to_uppercase());
        }

        #[test]
        fn prop_other_lengths_rejected(code in "[A-Z]{0,2}|[A-Z]{4,8}") {
            prop_assert!(Currency::parse(&code).is_err());
        }
    }
}
