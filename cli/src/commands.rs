//! CLI subcommands.

use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use uuid::Uuid;

use currencycloud_client::{CurrencyCloud, FindRatesParams, RateQuoteParams};
use currencycloud_common::{ContactId, ConversionDatePreference, FixedSide};

/// Arguments of `currencycloud rate`.
#[derive(Args, Debug)]
pub struct RateArgs {
    /// Currency to buy
    #[arg(long)]
    pub buy: String,

    /// Currency to sell
    #[arg(long)]
    pub sell: String,

    /// Side whose amount is fixed (buy or sell)
    #[arg(long)]
    pub side: FixedSide,

    /// Amount on the fixed side
    #[arg(long)]
    pub amount: Decimal,

    /// Requested conversion date (YYYY-MM-DD)
    #[arg(long)]
    pub conversion_date: Option<NaiveDate>,

    /// default, earliest or optimize_liquidity
    #[arg(long)]
    pub preference: Option<ConversionDatePreference>,

    /// Contact to act on behalf of
    #[arg(long)]
    pub on_behalf_of: Option<Uuid>,
}

impl RateArgs {
    pub fn to_params(&self) -> RateQuoteParams {
        RateQuoteParams {
            buy_currency: Some(self.buy.clone()),
            sell_currency: Some(self.sell.clone()),
            fixed_side: Some(self.side),
            amount: Some(self.amount),
            conversion_date: self.conversion_date,
            conversion_date_preference: self.preference,
            on_behalf_of: self.on_behalf_of.map(ContactId::from),
        }
    }
}

/// Arguments of `currencycloud find`.
#[derive(Args, Debug)]
pub struct FindArgs {
    /// Currency pairs such as USDGBP
    #[arg(required = true)]
    pub pairs: Vec<String>,

    /// Skip pairs the API does not recognise instead of failing
    #[arg(long)]
    pub ignore_invalid: bool,

    /// Contact to act on behalf of
    #[arg(long)]
    pub on_behalf_of: Option<Uuid>,
}

impl FindArgs {
    pub fn to_params(&self) -> FindRatesParams {
        FindRatesParams {
            currency_pairs: self.pairs.clone(),
            ignore_invalid_pairs: self.ignore_invalid.then_some(true),
            on_behalf_of: self.on_behalf_of.map(ContactId::from),
        }
    }
}

pub async fn rate(client: &CurrencyCloud, args: &RateArgs) -> anyhow::Result<String> {
    let quote = client.rates().get(&args.to_params())?.await?;
    Ok(serde_json::to_string_pretty(&quote)?)
}

pub async fn find(client: &CurrencyCloud, args: &FindArgs) -> anyhow::Result<String> {
    let found = client.rates().find(&args.to_params())?.await?;
    Ok(serde_json::to_string_pretty(&found)?)
}
