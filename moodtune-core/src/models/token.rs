use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// OAuth tokens delivered by the authorization redirect, plus the playback
/// device that the SDK reports once connected.
///
/// Every field is written at most once; `access_token` never changes after it
/// is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub scopes: BTreeSet<String>,
    pub refresh_token: Option<String>,
    pub sdk_ready: bool,
    pub device_id: Option<String>,
}

impl TokenState {
    /// Reads `access_token`, `scope` and `refresh_token` from a URL query
    /// string (with or without the leading `?`).
    ///
    /// Scope and refresh token are only taken when an access token is present.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut access_token = None;
        let mut scope = None;
        let mut refresh_token = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "access_token" if access_token.is_none() => access_token = Some(value.to_string()),
                "scope" if scope.is_none() => scope = Some(value.to_string()),
                "refresh_token" if refresh_token.is_none() => refresh_token = Some(value.to_string()),
                _ => {}
            }
        }

        let Some(access_token) = access_token else {
            return Self::default();
        };

        Self {
            access_token: Some(access_token),
            scopes: scope.as_deref().map(parse_scopes).unwrap_or_default(),
            refresh_token,
            sdk_ready: false,
            device_id: None,
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token.is_some()
    }
}

fn parse_scopes(raw: &str) -> BTreeSet<String> {
    raw.split(|c: char| c == ' ' || c == ',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
