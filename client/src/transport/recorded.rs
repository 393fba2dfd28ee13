//! Recording and replay of API interactions.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use currencycloud_common::{CurrencyCloudError, Result};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{ApiRequest, Method, Response, Transport};

fn default_status() -> u16 {
    200
}

/// A recorded request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

impl Interaction {
    fn key(&self) -> RequestKey {
        RequestKey {
            method: self.method,
            path: self.path.clone(),
            params: self.params.clone(),
        }
    }
}

/// What a request is matched on. The auth token is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct RequestKey {
    method: Method,
    path: String,
    params: BTreeMap<String, String>,
}

impl RequestKey {
    fn of(request: &ApiRequest) -> Self {
        Self {
            method: request.method,
            path: request.path.clone(),
            params: request.params.clone(),
        }
    }
}

/// Transport that replays recorded interactions.
///
/// Requests are matched on method, path and the full parameter set. Every
/// request received is kept so callers can check what was sent.
///
/// Built with [`recording`](Self::recording), it forwards every request to
/// another transport instead and keeps the answers, which
/// [`save`](Self::save) writes out in the format [`from_file`](Self::from_file)
/// reads.
#[derive(Default)]
pub struct RecordedTransport {
    interactions: DashMap<RequestKey, Interaction>,
    received: Mutex<Vec<ApiRequest>>,
    upstream: Option<Arc<dyn Transport>>,
}

impl RecordedTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the exchanges made through `upstream`.
    pub fn recording(upstream: Arc<dyn Transport>) -> Self {
        Self {
            upstream: Some(upstream),
            ..Self::default()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.upstream.is_some()
    }

    /// Load interactions from a JSON array.
    pub fn from_json(json: &str) -> Result<Self> {
        let interactions: Vec<Interaction> = serde_json::from_str(json)
            .map_err(|e| CurrencyCloudError::Configuration(format!("Invalid recording: {}", e)))?;

        let transport = Self::new();
        for interaction in interactions {
            transport.record(interaction);
        }
        Ok(transport)
    }

    /// Load interactions from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CurrencyCloudError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Add or replace an interaction.
    pub fn record(&self, interaction: Interaction) {
        self.interactions.insert(interaction.key(), interaction);
    }

    /// Known interactions as a JSON array, ordered by method, path and params.
    pub fn to_json(&self) -> Result<String> {
        let mut interactions: Vec<(RequestKey, Interaction)> = self
            .interactions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        interactions.sort_by(|a, b| a.0.cmp(&b.0));

        let interactions: Vec<Interaction> = interactions.into_iter().map(|(_, i)| i).collect();
        serde_json::to_string_pretty(&interactions).map_err(|e| {
            CurrencyCloudError::Configuration(format!("Cannot encode recording: {}", e))
        })
    }

    /// Write the known interactions to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| {
            CurrencyCloudError::Configuration(format!("Cannot write {}: {}", path.display(), e))
        })?;

        info!(
            path = %path.display(),
            interactions = self.interactions.len(),
            "Recording saved"
        );
        Ok(())
    }

    /// Requests received so far, oldest first.
    pub fn received(&self) -> Vec<ApiRequest> {
        self.received.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.received.lock().len()
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }
}

#[async_trait]
impl Transport for RecordedTransport {
    fn name(&self) -> &str {
        if self.is_recording() {
            "recording"
        } else {
            "recorded"
        }
    }

    async fn exchange(&self, request: &ApiRequest) -> Result<Response> {
        self.received.lock().push(request.clone());
        let key = RequestKey::of(request);

        if let Some(upstream) = &self.upstream {
            let response = upstream.exchange(request).await?;
            debug!(request = %request.request_line(), status = response.status, "Recording response");
            self.interactions.insert(
                key,
                Interaction {
                    method: request.method,
                    path: request.path.clone(),
                    params: request.params.clone(),
                    status: response.status,
                    body: response.body.clone(),
                },
            );
            return Ok(response);
        }

        let response = match self.interactions.get(&key) {
            Some(interaction) => Response::new(interaction.status, interaction.body.clone()),
            None => {
                return Err(CurrencyCloudError::Network(format!(
                    "No recorded interaction for {} {:?}",
                    request.request_line(),
                    request.params
                )))
            }
        };

        debug!(request = %request.request_line(), status = response.status, "Replaying recorded response");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const RECORDING: &str = r#"[
        {
            "method": "GET",
            "path": "/v2/rates/find",
            "params": { "currency_pair": "USDGBP" },
            "body": { "rates": { "USDGBP": ["0.8110", "0.8115"] }, "unavailable": [] }
        },
        {
            "method": "GET",
            "path": "/v2/rates/find",
            "params": { "currency_pair": "XXXYYY" },
            "status": 400,
            "body": { "error_code": "rate_find_failed", "error_messages": {} }
        }
    ]"#;

    #[tokio::test]
    async fn test_replays_matching_interaction() {
        let transport = RecordedTransport::from_json(RECORDING).unwrap();
        assert_eq!(transport.interaction_count(), 2);

        let request = ApiRequest::get("/v2/rates/find").param("currency_pair", "USDGBP");
        let body = assert_ok!(transport.send(&request).await);
        assert_eq!(body["rates"]["USDGBP"][0], json!("0.8110"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_recorded_error_status() {
        let transport = RecordedTransport::from_json(RECORDING).unwrap();
        let request = ApiRequest::get("/v2/rates/find").param("currency_pair", "XXXYYY");

        let err = assert_err!(transport.send(&request).await);
        assert_eq!(err.error_code(), "rate_find_failed");
    }

    #[tokio::test]
    async fn test_unmatched_request() {
        let transport = RecordedTransport::new();
        let request = ApiRequest::get("/v2/rates/find").param("currency_pair", "EURUSD");

        let err = assert_err!(transport.send(&request).await);
        assert!(matches!(err, CurrencyCloudError::Network(_)));
        assert_eq!(transport.received(), vec![request]);
    }

    #[tokio::test]
    async fn test_params_are_matched_as_a_set() {
        let transport = RecordedTransport::new();
        transport.record(Interaction {
            method: Method::Get,
            path: "/v2/rates/find".to_string(),
            params: BTreeMap::from([("currency_pair".to_string(), "USDGBP&on_behalf_of=1".to_string())]),
            status: 200,
            body: json!({ "rates": {} }),
        });

        // Same flattened text, different parameters.
        let request = ApiRequest::get("/v2/rates/find")
            .param("currency_pair", "USDGBP")
            .param("on_behalf_of", "1");
        let err = assert_err!(transport.send(&request).await);
        assert!(matches!(err, CurrencyCloudError::Network(_)));

        let request = ApiRequest::get("/v2/rates/find").param("currency_pair", "USDGBP&on_behalf_of=1");
        assert_ok!(transport.send(&request).await);
    }

    /// Answers every request with a fixed status and a body naming the path.
    struct StubTransport {
        status: u16,
    }

    #[async_trait]
    impl Transport for StubTransport {
        fn name(&self) -> &str {
            "stub"
        }

        async fn exchange(&self, request: &ApiRequest) -> Result<Response> {
            Ok(Response::new(self.status, json!({ "path": request.path, "params": request.params })))
        }
    }

    #[tokio::test]
    async fn test_recording_then_replay() {
        let recorder = RecordedTransport::recording(Arc::new(StubTransport { status: 200 }));
        assert!(recorder.is_recording());

        let find = ApiRequest::get("/v2/rates/find")
            .param("currency_pair", "USDGBP")
            .with_auth_token("4df5b3e5");
        let login = ApiRequest::post("/v2/authenticate/api").param("login_id", "dev@example.com");

        let recorded_find = assert_ok!(recorder.send(&find).await);
        assert_ok!(recorder.send(&login).await);
        assert_eq!(recorder.interaction_count(), 2);
        assert_eq!(recorder.request_count(), 2);

        let path = std::env::temp_dir().join(format!("currencycloud-recording-{}.json", std::process::id()));
        recorder.save(&path).unwrap();

        let replay = RecordedTransport::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(!replay.is_recording());
        assert_eq!(replay.interaction_count(), 2);
        assert_eq!(assert_ok!(replay.send(&find).await), recorded_find);
        assert_eq!(
            assert_ok!(replay.send(&login).await)["path"],
            json!("/v2/authenticate/api")
        );
    }

    #[tokio::test]
    async fn test_recording_keeps_error_answers() {
        let recorder = RecordedTransport::recording(Arc::new(StubTransport { status: 400 }));
        let request = ApiRequest::get("/v2/rates/detailed").param("buy_currency", "XXX");

        let err = assert_err!(recorder.send(&request).await);
        assert!(err.is_remote_failure());

        let replay = RecordedTransport::from_json(&recorder.to_json().unwrap()).unwrap();
        let response = assert_ok!(replay.exchange(&request).await);
        assert_eq!(response.status, 400);
        assert!(assert_err!(replay.send(&request).await).is_remote_failure());
    }

    #[test]
    fn test_invalid_recording() {
        assert!(RecordedTransport::from_json("{").is_err());
        assert!(RecordedTransport::from_file("/nonexistent/recording.json").is_err());
    }
}
