//! Entry point of the Currencycloud client.

use std::sync::Arc;

use currencycloud_common::{CurrencyCloudError, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::rates::Rates;
use crate::session::Session;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Client for the Currencycloud API.
///
/// The session must be opened with [`login`](Self::login) before any lookup
/// and should be closed with [`logout`](Self::logout) afterwards.
pub struct CurrencyCloud {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    session: Session,
}

impl CurrencyCloud {
    /// Create a client that talks HTTPS to the configured environment.
    pub fn new(config: ClientConfig) -> Result<Self> {
        CurrencyCloudBuilder::new(config).build()
    }

    pub fn builder(config: ClientConfig) -> CurrencyCloudBuilder {
        CurrencyCloudBuilder::new(config)
    }

    /// Open an API session.
    pub async fn login(&self) -> Result<()> {
        self.session.login(self.transport.as_ref()).await
    }

    /// Close the API session.
    pub async fn logout(&self) -> Result<()> {
        self.session.logout(self.transport.as_ref()).await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Rate lookup operations.
    pub fn rates(&self) -> Rates<'_> {
        Rates::new(self)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send an authenticated request and decode the response body.
    pub(crate) async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let token = self.session.token().await?;
        let request = request.with_auth_token(token);

        debug!(
            transport = self.transport.name(),
            request = %request.request_line(),
            "Sending request"
        );

        let body = self.transport.send(&request).await?;
        serde_json::from_value(body).map_err(|e| {
            CurrencyCloudError::UnexpectedResponse(format!("{}: {}", request.request_line(), e))
        })
    }
}

/// Builder for [`CurrencyCloud`].
pub struct CurrencyCloudBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl CurrencyCloudBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    /// Use a custom transport instead of HTTPS.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CurrencyCloud> {
        self.config.validate()?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };

        info!(
            environment = %self.config.environment,
            base_url = %self.config.effective_base_url(),
            transport = transport.name(),
            "Currencycloud client created"
        );

        let session = Session::new(self.config.login_id.clone(), self.config.api_key.clone());

        Ok(CurrencyCloud {
            config: self.config,
            transport,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::rates::{FindRatesParams, RateQuoteParams};
    use crate::transport::RecordedTransport;
    use currencycloud_common::FixedSide;
    use rust_decimal_macros::dec;
    use tokio_test::assert_err;

    fn test_config() -> ClientConfig {
        ClientConfig::new(Environment::Demonstration, "dev@example.com", "deadbeef")
    }

    #[test]
    fn test_builder_validates_config() {
        let result = CurrencyCloud::builder(ClientConfig::default())
            .transport(Arc::new(RecordedTransport::new()))
            .build();
        assert!(matches!(result, Err(CurrencyCloudError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_lookup_without_login() {
        let transport = Arc::new(RecordedTransport::new());
        let client = CurrencyCloud::builder(test_config())
            .transport(transport.clone())
            .build()
            .unwrap();

        let params = RateQuoteParams::new()
            .buy_currency("EUR")
            .sell_currency("GBP")
            .fixed_side(FixedSide::Buy)
            .amount(dec!(6700));

        let err = assert_err!(client.rates().get(&params).unwrap().await);
        assert!(matches!(err, CurrencyCloudError::NotAuthenticated));
        assert!(err.is_remote_failure());

        let err = assert_err!(
            client
                .rates()
                .find(&FindRatesParams::new().currency_pair("USDGBP"))
                .unwrap()
                .await
        );
        assert!(matches!(err, CurrencyCloudError::NotAuthenticated));
        assert_eq!(transport.request_count(), 0);
    }
}
