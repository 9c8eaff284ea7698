use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Facial expression labels produced by the expression detector.
///
/// Declaration order is the fixed tie-break order used when two expressions
/// share the maximum probability: the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Neutral,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgusted,
    Surprised,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fearful,
        EmotionLabel::Disgusted,
        EmotionLabel::Surprised,
    ];

    /// Wire name used by the detector and the recommendation backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fearful => "fearful",
            Self::Disgusted => "disgusted",
            Self::Surprised => "surprised",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0}")]
pub struct UnknownEmotion(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Probability per expression for a single face (values in 0.0–1.0).
///
/// Backed by a `BTreeMap` so iteration follows `EmotionLabel` declaration
/// order, which makes the argmax tie-break deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionScores(BTreeMap<EmotionLabel, f32>);

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: EmotionLabel, probability: f32) -> Self {
        self.insert(label, probability);
        self
    }

    pub fn insert(&mut self, label: EmotionLabel, probability: f32) {
        self.0.insert(label, probability);
    }

    pub fn get(&self, label: EmotionLabel) -> Option<f32> {
        self.0.get(&label).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Expression with the highest probability.
    ///
    /// NaN scores are ignored. On ties the label declared first wins.
    pub fn dominant(&self) -> Option<(EmotionLabel, f32)> {
        let mut best: Option<(EmotionLabel, f32)> = None;
        for (&label, &score) in &self.0 {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((label, score)),
            }
        }
        best
    }
}

impl FromIterator<(EmotionLabel, f32)> for ExpressionScores {
    fn from_iter<I: IntoIterator<Item = (EmotionLabel, f32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One detected face and its expression distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceExpressions {
    pub face_id: u32,
    pub expressions: ExpressionScores,
}

/// Output of one detector call: faces in detection order, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceResult {
    pub faces: Vec<FaceExpressions>,
}

impl InferenceResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a result from per-face distributions, numbering faces in order.
    pub fn from_faces(faces: impl IntoIterator<Item = ExpressionScores>) -> Self {
        Self {
            faces: faces
                .into_iter()
                .enumerate()
                .map(|(i, expressions)| FaceExpressions {
                    face_id: i as u32,
                    expressions,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn first_face(&self) -> Option<&FaceExpressions> {
        self.faces.first()
    }
}
