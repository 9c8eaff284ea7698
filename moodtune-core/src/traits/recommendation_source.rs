use async_trait::async_trait;

use crate::models::emotion::EmotionLabel;
use crate::models::error::RecommendationFetchError;
use crate::models::recommendation::Recommendation;

/// Anything that can turn (emotion, access token) into an ordered track list.
///
/// Implemented by `RecommendationClient` over HTTP.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn fetch(
        &self,
        emotion: EmotionLabel,
        access_token: &str,
    ) -> Result<Recommendation, RecommendationFetchError>;
}
