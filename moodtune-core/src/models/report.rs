use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::emotion::EmotionLabel;
use super::state::SessionStatus;

/// Result of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Camera acquired and sampling activated.
    Started { session_id: Uuid },
    /// A session was already capturing; nothing changed.
    AlreadyCapturing { session_id: Uuid },
}

impl StartOutcome {
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::Started { session_id } | Self::AlreadyCapturing { session_id } => *session_id,
        }
    }
}

/// What happened to the recommendation request at stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationStatus {
    /// No access token; the request was never sent.
    NotAuthorized,
    /// The request failed; treated as "no recommendations available".
    Unavailable { reason: String },
    Received { track_count: usize },
}

/// What the playback handoff did with the recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandoffOutcome {
    Forwarded { uri: String },
    /// Empty recommendation: a normal outcome, not an error.
    NothingToPlay,
    /// The playback component rejected the track.
    Failed { reason: String },
    /// No recommendation was fetched, so nothing was handed off.
    Skipped,
}

/// Summary of a completed session, returned by `stop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub emotion: EmotionLabel,
    pub started_at: Option<DateTime<Utc>>,
    pub stopped_at: DateTime<Utc>,
    pub ticks_applied: u32,
    pub recommendation: RecommendationStatus,
    pub playback: HandoffOutcome,
}

/// Read-only view of the orchestrator for UI-facing consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub status: SessionStatus,
    pub last_emotion: Option<EmotionLabel>,
    pub camera_active: bool,
    pub authorized: bool,
    pub sdk_ready: bool,
    pub device_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn report_serializes_tagged_outcomes() {
        let report = SessionReport {
            session_id: Uuid::nil(),
            emotion: EmotionLabel::Happy,
            started_at: None,
            stopped_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            ticks_applied: 3,
            recommendation: RecommendationStatus::Received { track_count: 1 },
            playback: HandoffOutcome::Forwarded { uri: "x".into() },
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["emotion"], json!("happy"));
        assert_eq!(value["recommendation"], json!({"status": "received", "track_count": 1}));
        assert_eq!(value["playback"], json!({"status": "forwarded", "uri": "x"}));
    }
}
