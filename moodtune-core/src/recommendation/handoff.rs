use std::sync::Arc;

use crate::models::error::PlaybackSdkError;
use crate::models::recommendation::Recommendation;
use crate::models::report::HandoffOutcome;
use crate::traits::playback::{PlaybackController, PlaybackRequest};

/// Forwards the primary recommendation to the playback component.
pub struct PlaybackHandoff {
    player: Arc<dyn PlaybackController>,
}

impl PlaybackHandoff {
    pub fn new(player: Arc<dyn PlaybackController>) -> Self {
        Self { player }
    }

    /// Play track 0 of `recommendation`.
    ///
    /// An empty recommendation is `NothingToPlay`, not an error. A player
    /// failure is returned alongside a `Failed` outcome so the caller can
    /// report it.
    pub async fn hand_off(
        &self,
        recommendation: &Recommendation,
        access_token: &str,
        device_id: Option<&str>,
    ) -> (HandoffOutcome, Option<PlaybackSdkError>) {
        let Some(track) = recommendation.first() else {
            log::info!("No recommendations to play");
            return (HandoffOutcome::NothingToPlay, None);
        };

        let request = PlaybackRequest {
            uri: track.uri.clone(),
            access_token: access_token.to_string(),
            device_id: device_id.map(str::to_string),
        };

        match self.player.play(request).await {
            Ok(()) => {
                log::info!("Handed {} to playback", track.uri);
                (HandoffOutcome::Forwarded { uri: track.uri.clone() }, None)
            }
            Err(e) => {
                log::warn!("Playback rejected {}: {}", track.uri, e);
                (HandoffOutcome::Failed { reason: e.to_string() }, Some(e))
            }
        }
    }
}
