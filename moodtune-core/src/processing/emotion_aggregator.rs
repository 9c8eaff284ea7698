use crate::models::emotion::{EmotionLabel, InferenceResult};
use crate::models::state::Session;

/// Reduces an inference result to a single emotion.
///
/// Only the first detected face counts and no history is kept: each
/// non-empty result replaces the previous emotion outright.
pub struct EmotionAggregator;

impl EmotionAggregator {
    /// Dominant expression of face 0, or `None` for an empty result.
    pub fn dominant(result: &InferenceResult) -> Option<EmotionLabel> {
        result
            .first_face()
            .and_then(|face| face.expressions.dominant())
            .map(|(label, _)| label)
    }

    /// Write the dominant emotion into the session.
    ///
    /// Returns the new emotion, or `None` when the session was left unchanged.
    pub fn apply(result: &InferenceResult, session: &mut Session) -> Option<EmotionLabel> {
        let emotion = Self::dominant(result)?;
        session.last_emotion = Some(emotion);
        session.ticks_applied += 1;
        Some(emotion)
    }
}
