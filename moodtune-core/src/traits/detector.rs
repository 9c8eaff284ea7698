use std::path::Path;

use async_trait::async_trait;

use crate::models::config::DetectorOptions;
use crate::models::emotion::InferenceResult;
use crate::models::error::InferenceTickError;
use crate::models::frame::VideoFrame;

/// Black-box facial expression model.
#[async_trait]
pub trait ExpressionDetector: Send + Sync {
    /// Load face detection and expression weights from `location`.
    /// Called once before the first session.
    async fn load(&self, location: &Path) -> Result<(), InferenceTickError>;

    /// Detect every face in `frame` with its expression distribution.
    /// An empty result means no face was found.
    async fn detect(
        &self,
        frame: &VideoFrame,
        options: &DetectorOptions,
    ) -> Result<InferenceResult, InferenceTickError>;
}
