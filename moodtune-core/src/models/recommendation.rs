use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A playable track returned by the recommendation backend.
///
/// Everything besides `uri` is kept verbatim in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Track {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            metadata: Map::new(),
        }
    }
}

/// Ordered tracks for one (token, emotion) request. Never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tracks: Vec<Track>,
}

impl Recommendation {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// The primary recommendation.
    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// Extracts the track list from a backend response body.
    ///
    /// A missing or non-array `tracks` field is an empty recommendation.
    /// Entries without a string `uri` are dropped.
    pub fn from_body(body: &Value) -> Self {
        let Some(entries) = body.get("tracks").and_then(Value::as_array) else {
            return Self::empty();
        };

        let tracks = entries
            .iter()
            .filter_map(|entry| match serde_json::from_value::<Track>(entry.clone()) {
                Ok(track) => Some(track),
                Err(e) => {
                    log::warn!("skipping recommendation entry without a usable uri: {}", e);
                    None
                }
            })
            .collect();

        Self { tracks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_server_order_and_metadata() {
        let body = json!({
            "tracks": [
                {"uri": "spotify:track:a", "name": "A", "popularity": 40},
                {"uri": "spotify:track:b"}
            ]
        });

        let rec = Recommendation::from_body(&body);
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.first().map(|t| t.uri.as_str()), Some("spotify:track:a"));
        assert_eq!(rec.tracks[0].metadata.get("name"), Some(&json!("A")));
        assert!(!rec.tracks[0].metadata.contains_key("uri"));
    }

    #[test]
    fn missing_or_malformed_tracks_is_empty() {
        assert!(Recommendation::from_body(&json!({})).is_empty());
        assert!(Recommendation::from_body(&json!({"tracks": "nope"})).is_empty());
        assert!(Recommendation::from_body(&json!({"tracks": null})).is_empty());
        assert!(Recommendation::from_body(&json!([1, 2])).is_empty());
    }

    #[test]
    fn entries_without_uri_are_dropped() {
        let body = json!({"tracks": [{"name": "no uri"}, {"uri": 7}, {"uri": "x"}]});
        let rec = Recommendation::from_body(&body);
        assert_eq!(rec.tracks, vec![Track::new("x")]);
    }
}
