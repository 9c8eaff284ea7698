use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::emotion::EmotionLabel;

/// Session state machine.
///
/// State transitions:
/// ```text
/// idle ──start──→ capturing ──stop──→ stopped ──(immediate)──→ idle
/// ```
/// `Stopped` is transient: it only exists while the recommendation fetch and
/// playback handoff run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Capturing,
    Stopped,
}

impl SessionStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }
}

/// The single live session owned by the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub status: SessionStatus,
    pub last_emotion: Option<EmotionLabel>,
    pub started_at: Option<DateTime<Utc>>,
    pub ticks_applied: u32,
}

impl Session {
    pub fn idle() -> Self {
        Self {
            id: Uuid::nil(),
            status: SessionStatus::Idle,
            last_emotion: None,
            started_at: None,
            ticks_applied: 0,
        }
    }

    /// Fresh capturing session with a new id and no emotion yet.
    pub fn begin() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SessionStatus::Capturing,
            last_emotion: None,
            started_at: Some(Utc::now()),
            ticks_applied: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::idle();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::idle()
    }
}
