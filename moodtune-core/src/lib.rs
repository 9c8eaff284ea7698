//! # moodtune-core
//!
//! Session orchestration for emotion-driven music recommendation.
//!
//! A session acquires the camera, samples facial expressions on a fixed
//! interval, keeps the latest dominant emotion, and on stop asks the
//! recommendation backend for tracks and hands the first one to playback.
//! Platform pieces (camera, expression model, playback SDK, navigation)
//! implement the traits in `traits/` and plug into `SessionStateMachine`.
//!
//! ## Architecture
//!
//! ```text
//! moodtune-core (this crate)
//! ├── traits/          ← CameraDevice, ExpressionDetector, PlaybackSdk, PlaybackController,
//! │                      RecommendationSource, Navigator, SessionDelegate
//! ├── models/          ← SessionConfig, Session, EmotionLabel, TokenState, Recommendation, errors
//! ├── capture/         ← CaptureManager (camera stream ownership)
//! ├── auth/            ← TokenLifecycle (callback tokens, SDK bring-up, device id)
//! ├── processing/      ← InferenceScheduler, EmotionAggregator
//! ├── recommendation/  ← RecommendationClient (HTTP), PlaybackHandoff
//! └── session/         ← SessionStateMachine, controller task + SessionHandle
//! ```

pub mod auth;
pub mod capture;
pub mod models;
pub mod processing;
pub mod recommendation;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use auth::token_lifecycle::{launch_tokens, TokenLifecycle};
pub use capture::manager::{CaptureHandle, CaptureManager};
pub use models::config::{DetectorOptions, PlayerSettings, SessionConfig};
pub use models::emotion::{EmotionLabel, ExpressionScores, FaceExpressions, InferenceResult};
pub use models::error::{
    CaptureError, ConfigError, InferenceTickError, PlaybackSdkError, RecommendationFetchError,
    SessionError,
};
pub use models::frame::{PixelFormat, VideoFrame};
pub use models::recommendation::{Recommendation, Track};
pub use models::report::{
    HandoffOutcome, RecommendationStatus, SessionReport, SessionSnapshot, StartOutcome,
};
pub use models::state::{Session, SessionStatus};
pub use models::token::TokenState;
pub use processing::emotion_aggregator::EmotionAggregator;
pub use processing::inference_scheduler::{InferenceScheduler, SchedulerDiagnostics, TickReport};
pub use recommendation::client::RecommendationClient;
pub use recommendation::handoff::PlaybackHandoff;
pub use session::controller::{spawn, SessionHandle};
pub use session::state_machine::{Collaborators, MachineEvent, SessionStateMachine};
pub use traits::camera::{CameraDevice, CaptureConstraints, MediaStream, MediaTrack};
pub use traits::detector::ExpressionDetector;
pub use traits::navigator::Navigator;
pub use traits::playback::{
    PlaybackController, PlaybackRequest, PlaybackSdk, PlayerOptions, SdkEvent, TokenProvider,
};
pub use traits::recommendation_source::RecommendationSource;
pub use traits::session_delegate::SessionDelegate;
