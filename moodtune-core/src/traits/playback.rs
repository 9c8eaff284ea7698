use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::error::PlaybackSdkError;

/// Callback the SDK invokes whenever it needs an OAuth token.
pub type TokenProvider = Arc<dyn Fn() -> String + Send + Sync + 'static>;

/// Constructor arguments for an SDK player.
#[derive(Clone)]
pub struct PlayerOptions {
    pub name: String,
    pub volume: f32,
    pub get_oauth_token: TokenProvider,
}

impl std::fmt::Debug for PlayerOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerOptions")
            .field("name", &self.name)
            .field("volume", &self.volume)
            .finish_non_exhaustive()
    }
}

/// Events emitted by the playback SDK, one variant per listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkEvent {
    Ready { device_id: String },
    InitializationError { message: String },
    AuthenticationError { message: String },
    AccountError { message: String },
    PlaybackError { message: String },
}

impl SdkEvent {
    /// Name of the SDK listener this event corresponds to.
    pub fn listener(&self) -> &'static str {
        match self {
            Self::Ready { .. } => "ready",
            Self::InitializationError { .. } => "initialization_error",
            Self::AuthenticationError { .. } => "authentication_error",
            Self::AccountError { .. } => "account_error",
            Self::PlaybackError { .. } => "playback_error",
        }
    }

    /// The error carried by this event, if it is one of the error listeners.
    pub fn into_error(self) -> Option<PlaybackSdkError> {
        match self {
            Self::Ready { .. } => None,
            Self::InitializationError { message } => Some(PlaybackSdkError::Initialization(message)),
            Self::AuthenticationError { message } => Some(PlaybackSdkError::Authentication(message)),
            Self::AccountError { message } => Some(PlaybackSdkError::Account(message)),
            Self::PlaybackError { message } => Some(PlaybackSdkError::Playback(message)),
        }
    }
}

/// The external audio SDK.
///
/// `connect` constructs the player and starts delivering `SdkEvent`s on
/// `events` for as long as the player lives. Called at most once.
#[async_trait]
pub trait PlaybackSdk: Send + Sync {
    async fn connect(
        &self,
        options: PlayerOptions,
        events: mpsc::UnboundedSender<SdkEvent>,
    ) -> Result<(), PlaybackSdkError>;
}

/// A track handed to the playback component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    pub uri: String,
    pub access_token: String,
    /// SDK device to play on, when the SDK has reported one.
    pub device_id: Option<String>,
}

/// The external playback component.
#[async_trait]
pub trait PlaybackController: Send + Sync {
    async fn play(&self, request: PlaybackRequest) -> Result<(), PlaybackSdkError>;
}
