use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::models::config::SessionConfig;
use crate::models::emotion::EmotionLabel;
use crate::models::error::RecommendationFetchError;
use crate::models::recommendation::Recommendation;
use crate::traits::recommendation_source::RecommendationSource;

/// HTTP client for `GET <backend>/recommendations`.
pub struct RecommendationClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl RecommendationClient {
    pub fn new(backend_url: &Url, timeout: Duration) -> Result<Self, RecommendationFetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecommendationFetchError::Transport(format!("client build failed: {}", e)))?;
        Self::with_client(http, backend_url)
    }

    /// Client for the backend and timeout named in `config`.
    pub fn from_config(config: &SessionConfig) -> Result<Self, RecommendationFetchError> {
        Self::new(&config.backend_url, config.request_timeout())
    }

    /// Reuse an existing `reqwest::Client` (shared connection pool).
    pub fn with_client(http: reqwest::Client, backend_url: &Url) -> Result<Self, RecommendationFetchError> {
        let mut endpoint = backend_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|_| RecommendationFetchError::InvalidUrl(backend_url.to_string()))?
            .pop_if_empty()
            .push("recommendations");
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL with `access_token` and `emotion` query parameters.
    pub fn request_url(&self, emotion: EmotionLabel, access_token: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("access_token", access_token)
            .append_pair("emotion", emotion.as_str());
        url
    }
}

#[async_trait]
impl RecommendationSource for RecommendationClient {
    async fn fetch(
        &self,
        emotion: EmotionLabel,
        access_token: &str,
    ) -> Result<Recommendation, RecommendationFetchError> {
        let url = self.request_url(emotion, access_token);
        log::debug!("Requesting recommendations for {}", emotion);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| RecommendationFetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RecommendationFetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RecommendationFetchError::MalformedBody(e.to_string()))?;

        let recommendation = Recommendation::from_body(&body);
        log::info!(
            "Received {} recommendation(s) for {}",
            recommendation.len(),
            emotion
        );
        Ok(recommendation)
    }
}
