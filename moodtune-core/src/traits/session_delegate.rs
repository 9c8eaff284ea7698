use crate::models::emotion::EmotionLabel;
use crate::models::error::SessionError;
use crate::models::report::SessionReport;
use crate::models::state::SessionStatus;

/// Event delegate for session notifications.
///
/// All methods are called from the session actor. Implementations must not
/// block; marshal to a UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called on every status transition.
    fn on_status_changed(&self, status: SessionStatus);

    /// Called when the camera is acquired or released.
    fn on_camera_changed(&self, active: bool);

    /// Called when a tick replaces the current emotion.
    fn on_emotion_updated(&self, emotion: EmotionLabel);

    /// Called for capture failures and for non-fatal errors
    /// (SDK, recommendation, playback).
    fn on_error(&self, error: &SessionError);

    /// Called when a stop completes, before the session returns to idle.
    fn on_session_finished(&self, report: &SessionReport);
}
