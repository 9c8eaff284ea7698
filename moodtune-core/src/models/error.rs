use thiserror::Error;

/// Why the camera could not be acquired.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device available")]
    DeviceNotAvailable,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("unknown capture error: {0}")]
    Unknown(String),
}

/// A single inference tick failed. Swallowed by the scheduler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InferenceTickError {
    #[error("expression models not loaded")]
    ModelNotLoaded,

    #[error("failed to load expression models from {location}: {reason}")]
    ModelLoad { location: String, reason: String },

    #[error("inference failed: {0}")]
    Failed(String),
}

/// Errors reported by the playback SDK or the playback component.
/// Logged and surfaced to the delegate; never tears down the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackSdkError {
    #[error("initialization error: {0}")]
    Initialization(String),

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("account error: {0}")]
    Account(String),

    #[error("playback error: {0}")]
    Playback(String),

    #[error("connect failed: {0}")]
    Connect(String),
}

/// The recommendation request did not produce a usable response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecommendationFetchError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("recommendation request failed: {0}")]
    Transport(String),

    #[error("recommendation backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed recommendation body: {0}")]
    MalformedBody(String),
}

/// Errors surfaced by the session state machine and its handle.
///
/// Only `CaptureUnavailable` blocks a transition into `Capturing`; the
/// rejections (`NotCapturing`, `NoEmotionDetected`) leave state untouched, and
/// the remaining variants are reported to the delegate as non-fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureError),

    #[error("session is not capturing")]
    NotCapturing,

    #[error("no emotion detected yet")]
    NoEmotionDetected,

    #[error(transparent)]
    InferenceTick(#[from] InferenceTickError),

    #[error(transparent)]
    PlaybackSdk(#[from] PlaybackSdkError),

    #[error(transparent)]
    RecommendationFetch(#[from] RecommendationFetchError),

    #[error("session controller is not running")]
    ControllerClosed,
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
