//! Authentication session.

use currencycloud_common::{CurrencyCloudError, Result};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::transport::{ApiRequest, Transport};

const LOGIN_PATH: &str = "/v2/authenticate/api";
const LOGOUT_PATH: &str = "/v2/authenticate/close_session";

#[derive(Deserialize)]
struct AuthResponse {
    auth_token: String,
}

/// Holds the credentials and the auth token of an API session.
pub struct Session {
    login_id: String,
    api_key: String,
    token: RwLock<Option<String>>,
}

impl Session {
    pub fn new(login_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            login_id: login_id.into(),
            api_key: api_key.into(),
            token: RwLock::new(None),
        }
    }

    /// Open a session and store the returned auth token.
    #[instrument(skip(self, transport), fields(login_id = %self.login_id))]
    pub async fn login(&self, transport: &dyn Transport) -> Result<()> {
        let request = ApiRequest::post(LOGIN_PATH)
            .param("login_id", &self.login_id)
            .param("api_key", &self.api_key);

        let body = transport.send(&request).await?;
        let auth: AuthResponse = serde_json::from_value(body).map_err(|e| {
            CurrencyCloudError::UnexpectedResponse(format!("{}: {}", request.request_line(), e))
        })?;

        *self.token.write().await = Some(auth.auth_token);

        info!("Session opened");
        Ok(())
    }

    /// Close the session. A no-op when no session is open.
    ///
    /// The token is kept when the API refuses to close the session, so the
    /// call can be retried.
    #[instrument(skip(self, transport), fields(login_id = %self.login_id))]
    pub async fn logout(&self, transport: &dyn Transport) -> Result<()> {
        let token = match self.token.read().await.clone() {
            Some(token) => token,
            None => {
                debug!("No open session to close");
                return Ok(());
            }
        };

        let request = ApiRequest::post(LOGOUT_PATH).with_auth_token(token.clone());
        transport.send(&request).await?;

        let mut current = self.token.write().await;
        // A concurrent login may have replaced the token meanwhile.
        if current.as_deref() == Some(token.as_str()) {
            *current = None;
        }

        info!("Session closed");
        Ok(())
    }

    /// Current auth token.
    pub async fn token(&self) -> Result<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(CurrencyCloudError::NotAuthenticated)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}
