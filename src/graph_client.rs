use failsafe::futures::CircuitBreaker;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use std::fmt;
use std::time::Duration;

use crate::circuit_breaker::{create_graph_circuit_breaker, GraphCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::EntityStatus;
use crate::normalizer::{NormalizedAd, NormalizedAdSet, NormalizedCampaign};

type HmacSha256 = Hmac<Sha256>;

/// Graph API error codes that signal throttling rather than a bad request.
const THROTTLING_CODES: &[i64] = &[4, 17, 32, 613, 80004];

/// Error object Facebook returns as `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphErrorBody {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub error_subcode: Option<i64>,
    #[serde(default)]
    pub fbtrace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

/// Failure of a single Graph call, before it is folded into `AppError`.
#[derive(Debug, Clone)]
pub struct GraphFailure {
    /// HTTP status; `None` when the request never got a response.
    pub status: Option<u16>,
    pub code: Option<i64>,
    pub message: String,
}

impl GraphFailure {
    fn from_response(status: u16, payload: &Value) -> Self {
        match serde_json::from_value::<GraphErrorEnvelope>(payload.clone()) {
            Ok(envelope) => {
                let err = envelope.error;
                let mut message = err.message;
                if let Some(kind) = err.kind {
                    message = format!("{} [{}]", message, kind);
                }
                if let Some(subcode) = err.error_subcode {
                    message = format!("{} (subcode {})", message, subcode);
                }
                if let Some(trace) = err.fbtrace_id {
                    message = format!("{} fbtrace_id={}", message, trace);
                }
                Self {
                    status: Some(status),
                    code: err.code,
                    message,
                }
            }
            Err(_) => Self {
                status: Some(status),
                code: None,
                message: payload.to_string(),
            },
        }
    }

    /// Whether this failure should count against the circuit breaker.
    pub fn is_transient(&self) -> bool {
        match self.status {
            None => true,
            Some(status) if status >= 500 || status == 429 => true,
            _ => self.code.map_or(false, |c| THROTTLING_CODES.contains(&c)),
        }
    }
}

impl fmt::Display for GraphFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.code) {
            (Some(status), Some(code)) => {
                write!(f, "Graph API {} (code {}): {}", status, code, self.message)
            }
            (Some(status), None) => write!(f, "Graph API {}: {}", status, self.message),
            (None, _) => write!(f, "Graph API request failed: {}", self.message),
        }
    }
}

fn is_transient(failure: &GraphFailure) -> bool {
    failure.is_transient()
}

/// Client for the Facebook Marketing (Graph) API write endpoints.
///
/// Bodies come from the normalizer; this client only adds authentication,
/// submits, and reads back the created object's id.
#[derive(Clone)]
pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    access_token: String,
    appsecret_proof: Option<String>,
    breaker: GraphCircuitBreaker,
}

impl GraphClient {
    /// Creates a new `GraphClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Graph host, e.g. `https://graph.facebook.com`.
    /// * `api_version` - Version path segment, e.g. `v19.0`.
    /// * `access_token` - System user or long-lived user token.
    /// * `app_secret` - Optional app secret used to sign the token.
    pub fn new(
        base_url: String,
        api_version: String,
        access_token: String,
        app_secret: Option<&str>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create Graph client: {}", e))
            })?;

        let appsecret_proof = app_secret
            .map(|secret| appsecret_proof(secret, &access_token))
            .transpose()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version,
            access_token,
            appsecret_proof,
            breaker: create_graph_circuit_breaker(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.facebook_graph_base_url.clone(),
            config.facebook_api_version.clone(),
            config.facebook_access_token.clone(),
            config.facebook_app_secret.as_deref(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("access_token", self.access_token.clone())];
        if let Some(proof) = &self.appsecret_proof {
            params.push(("appsecret_proof", proof.clone()));
        }
        params
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, AppError> {
        let url = self.endpoint(path);
        tracing::info!("POST Graph API: {}", url);

        let request = self.client.post(&url).query(&self.auth_params()).json(body);

        let result = self
            .breaker
            .call_with(is_transient, async move {
                let response = request.send().await.map_err(|e| GraphFailure {
                    status: None,
                    code: None,
                    message: e.to_string(),
                })?;

                let status = response.status();
                let payload: Value = response.json().await.map_err(|e| GraphFailure {
                    status: Some(status.as_u16()),
                    code: None,
                    message: format!("Failed to parse Graph response: {}", e),
                })?;

                if !status.is_success() {
                    return Err(GraphFailure::from_response(status.as_u16(), &payload));
                }
                Ok(payload)
            })
            .await;

        match result {
            Ok(payload) => Ok(payload),
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Graph API circuit open, rejecting call to {}", url);
                Err(AppError::ExternalApiError(
                    "Graph API temporarily unavailable (circuit open)".to_string(),
                ))
            }
            Err(failsafe::Error::Inner(failure)) => {
                tracing::warn!("Graph API call to {} failed: {}", url, failure);
                Err(AppError::ExternalApiError(failure.to_string()))
            }
        }
    }

    async fn create(&self, path: &str, body: &impl Serialize) -> Result<String, AppError> {
        let payload = self.post(path, body).await?;

        let id = match payload.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                tracing::warn!("Unexpected Graph create response: {:?}", payload);
                return Err(AppError::ExternalApiError(
                    "Graph create response missing 'id' field".to_string(),
                ));
            }
        };

        tracing::info!("✓ Graph object created: {} ({})", id, path);
        Ok(id)
    }

    /// Creates a campaign under its ad account; returns the Facebook campaign id.
    pub async fn create_campaign(&self, campaign: &NormalizedCampaign) -> Result<String, AppError> {
        self.create(
            &format!("{}/campaigns", campaign.ad_account_id),
            &campaign_body(campaign)?,
        )
        .await
    }

    pub async fn create_adset(
        &self,
        ad_account_id: &str,
        adset: &NormalizedAdSet,
    ) -> Result<String, AppError> {
        self.create(&format!("{}/adsets", ad_account_id), adset).await
    }

    pub async fn create_ad(&self, ad_account_id: &str, ad: &NormalizedAd) -> Result<String, AppError> {
        self.create(&format!("{}/ads", ad_account_id), ad).await
    }

    /// Applies a partial update to any Graph object.
    pub async fn update_object(
        &self,
        facebook_id: &str,
        body: &impl Serialize,
    ) -> Result<(), AppError> {
        let payload = self.post(facebook_id, body).await?;

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(AppError::ExternalApiError(format!(
                "Graph update of {} reported success=false",
                facebook_id
            )));
        }
        Ok(())
    }

    /// Soft delete / archive by status transition.
    pub async fn set_status(&self, facebook_id: &str, status: EntityStatus) -> Result<(), AppError> {
        self.update_object(facebook_id, &json!({ "status": status }))
            .await
    }
}

/// Campaign body without `ad_account_id`, which Graph only takes in the path.
fn campaign_body(campaign: &NormalizedCampaign) -> Result<Value, AppError> {
    let mut body = serde_json::to_value(campaign)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize campaign: {}", e)))?;
    if let Some(fields) = body.as_object_mut() {
        fields.remove("ad_account_id");
    }
    Ok(body)
}

/// `appsecret_proof` as Facebook defines it: hex HMAC-SHA256 of the access
/// token keyed with the app secret.
pub fn appsecret_proof(app_secret: &str, access_token: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|e| AppError::InternalError(format!("Invalid app secret: {}", e)))?;
    mac.update(access_token.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = GraphClient::new(
            "https://graph.facebook.com/".to_string(),
            "v19.0".to_string(),
            "token".to_string(),
            Some("secret"),
        );
        assert!(client.is_ok());
        let client = client.unwrap();
        assert_eq!(
            client.endpoint("act_1/campaigns"),
            "https://graph.facebook.com/v19.0/act_1/campaigns"
        );
        assert_eq!(client.auth_params().len(), 2);
    }

    #[test]
    fn test_appsecret_proof_is_hmac_sha256_hex() {
        let proof =
            appsecret_proof("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            proof,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_graph_failure_parses_error_envelope() {
        let payload = json!({
            "error": {
                "message": "Invalid parameter",
                "type": "OAuthException",
                "code": 100,
                "error_subcode": 1487390,
                "fbtrace_id": "AbC123"
            }
        });

        let failure = GraphFailure::from_response(400, &payload);
        assert_eq!(failure.code, Some(100));
        assert!(failure.message.contains("Invalid parameter"));
        assert!(failure.message.contains("fbtrace_id=AbC123"));
        assert!(!failure.is_transient());
    }

    #[test]
    fn test_throttling_counts_as_transient() {
        let throttled = GraphFailure::from_response(
            400,
            &json!({ "error": { "message": "User request limit reached", "code": 17 } }),
        );
        assert!(throttled.is_transient());

        let server = GraphFailure::from_response(503, &json!({}));
        assert!(server.is_transient());
    }
}
