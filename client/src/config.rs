//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use currencycloud_common::{CurrencyCloudError, Result};

/// Currencycloud API environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Sandbox environment for integration work.
    Demonstration,
    Production,
    /// User acceptance testing.
    Uat,
}

impl Environment {
    /// Base URL of the environment.
    pub fn base_url(&self) -> &'static str {
        match self {
            Environment::Demonstration => "https://devapi.currencycloud.com",
            Environment::Production => "https://api.currencycloud.com",
            Environment::Uat => "https://api-uat1.ccycloud.com",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Environment::Demonstration => "demonstration",
            Environment::Production => "production",
            Environment::Uat => "uat",
        };
        f.write_str(name)
    }
}

impl FromStr for Environment {
    type Err = CurrencyCloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "demonstration" | "demo" => Ok(Environment::Demonstration),
            "production" | "prod" => Ok(Environment::Production),
            "uat" => Ok(Environment::Uat),
            other => Err(CurrencyCloudError::Configuration(format!(
                "Unknown environment `{}`",
                other
            ))),
        }
    }
}

/// Configuration for the Currencycloud client.
#[derive(Clone)]
pub struct ClientConfig {
    /// Target environment.
    pub environment: Environment,
    /// Overrides the environment's base URL when set.
    pub base_url: Option<String>,
    /// Login id (usually the account e-mail address).
    pub login_id: String,
    /// API key issued for the login id.
    pub api_key: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("login_id", &self.login_id)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Demonstration,
            base_url: None,
            login_id: String::new(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("currencycloud-rust/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with credentials for the given environment.
    pub fn new(
        environment: Environment,
        login_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            login_id: login_id.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(env) = std::env::var("CURRENCYCLOUD_ENV") {
            config.environment = env.parse()?;
        }

        if let Ok(url) = std::env::var("CURRENCYCLOUD_BASE_URL") {
            config.base_url = Some(url);
        }

        if let Ok(login_id) = std::env::var("CURRENCYCLOUD_LOGIN_ID") {
            config.login_id = login_id;
        }

        if let Ok(api_key) = std::env::var("CURRENCYCLOUD_API_KEY") {
            config.api_key = api_key;
        }

        if let Ok(secs) = std::env::var("CURRENCYCLOUD_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                CurrencyCloudError::Configuration(format!("Invalid timeout `{}`", secs))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// The base URL requests are sent to.
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.effective_base_url();
        if reqwest::Url::parse(base_url).is_err() {
            return Err(CurrencyCloudError::Configuration(format!(
                "Invalid base URL `{}`",
                base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(CurrencyCloudError::Configuration(
                "Request timeout cannot be zero".to_string(),
            ));
        }

        if self.login_id.is_empty() || self.api_key.is_empty() {
            return Err(CurrencyCloudError::Configuration(
                "Login id and API key are required".to_string(),
            ));
        }

        Ok(())
    }
}
