use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use url::Url;

use crate::models::config::PlayerSettings;
use crate::models::error::PlaybackSdkError;
use crate::models::token::TokenState;
use crate::traits::navigator::Navigator;
use crate::traits::playback::{PlaybackSdk, PlayerOptions, SdkEvent};

static LAUNCH_TOKENS: OnceLock<TokenState> = OnceLock::new();

/// Process-wide token bootstrap.
///
/// The first call parses `query`; every later call returns that same state
/// and ignores its argument.
pub fn launch_tokens(query: &str) -> &'static TokenState {
    LAUNCH_TOKENS.get_or_init(|| TokenState::from_query(query))
}

/// Holds the OAuth tokens and brings the playback SDK up once a token exists.
///
/// Lifecycle:
/// ```text
/// bootstrap(query) ──token?──→ initialize_sdk() ──connect──→ events… ──ready──→ device known
/// ```
/// The SDK is connected at most once per lifecycle. The first `ready` event
/// fixes the device id; later ones are ignored.
pub struct TokenLifecycle {
    state: TokenState,
    authorize_url: Url,
    sdk_started: bool,
    events: Option<mpsc::UnboundedReceiver<SdkEvent>>,
}

impl TokenLifecycle {
    /// Parse the callback query string once.
    pub fn bootstrap(query: &str, authorize_url: Url) -> Self {
        Self::from_state(TokenState::from_query(query), authorize_url)
    }

    /// Build from the process-wide `launch_tokens`.
    pub fn from_launch(query: &str, authorize_url: Url) -> Self {
        Self::from_state(launch_tokens(query).clone(), authorize_url)
    }

    pub fn from_state(state: TokenState, authorize_url: Url) -> Self {
        if state.is_authorized() {
            log_scopes(&state);
        }
        Self {
            state,
            authorize_url,
            sdk_started: false,
            events: None,
        }
    }

    pub fn state(&self) -> &TokenState {
        &self.state
    }

    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token.as_deref()
    }

    pub fn device_id(&self) -> Option<&str> {
        self.state.device_id.as_deref()
    }

    pub fn sdk_started(&self) -> bool {
        self.sdk_started
    }

    pub fn authorize_url(&self) -> &Url {
        &self.authorize_url
    }

    /// Redirect the user to the authorization endpoint.
    pub fn authorize(&self, navigator: &dyn Navigator) {
        log::info!("Redirecting to authorization endpoint {}", self.authorize_url);
        navigator.navigate(&self.authorize_url);
    }

    /// Accept a redirect callback that arrived after construction.
    ///
    /// Only fills an empty state. When a token is already held the callback is
    /// ignored and the existing token (and SDK device) stay in use.
    pub fn accept_callback(&mut self, query: &str) -> bool {
        let incoming = TokenState::from_query(query);
        if !incoming.is_authorized() {
            log::debug!("Authorization callback carried no access token");
            return false;
        }
        if self.state.is_authorized() {
            log::warn!("Ignoring authorization callback: an access token is already held");
            return false;
        }

        log_scopes(&incoming);
        self.state.access_token = incoming.access_token;
        self.state.scopes = incoming.scopes;
        self.state.refresh_token = incoming.refresh_token;
        true
    }

    /// Whether a token is present but the SDK has not been brought up yet.
    pub fn needs_sdk(&self) -> bool {
        self.state.is_authorized() && !self.sdk_started
    }

    /// Connect the playback SDK. Runs at most once; returns `Ok(false)` when
    /// there is no token yet or the SDK was already started.
    ///
    /// A failed connect still counts as the one attempt.
    pub async fn initialize_sdk(
        &mut self,
        sdk: &dyn PlaybackSdk,
        player: &PlayerSettings,
    ) -> Result<bool, PlaybackSdkError> {
        if self.sdk_started {
            return Ok(false);
        }
        let Some(token) = self.state.access_token.clone() else {
            return Ok(false);
        };
        self.sdk_started = true;

        let (tx, rx) = mpsc::unbounded_channel();
        let options = PlayerOptions {
            name: player.name.clone(),
            volume: player.volume,
            get_oauth_token: Arc::new(move || token.clone()),
        };

        if let Err(e) = sdk.connect(options, tx).await {
            log::warn!("Playback SDK connect failed: {}", e);
            return Err(e);
        }

        log::info!("Playback SDK connecting as \"{}\"", player.name);
        self.events = Some(rx);
        Ok(true)
    }

    /// Apply an SDK event. Error events come back as `Err` for the caller to
    /// report; they never change token state.
    pub fn handle_event(&mut self, event: SdkEvent) -> Result<(), PlaybackSdkError> {
        if let SdkEvent::Ready { device_id } = event {
            if self.state.sdk_ready {
                log::debug!(
                    "Ignoring ready event for device {}: already ready on {:?}",
                    device_id,
                    self.state.device_id
                );
            } else {
                log::info!("Playback SDK ready with device {}", device_id);
                self.state.device_id = Some(device_id);
                self.state.sdk_ready = true;
            }
            return Ok(());
        }

        let listener = event.listener();
        match event.into_error() {
            Some(error) => {
                log::warn!("Playback SDK {}: {}", listener, error);
                Err(error)
            }
            None => Ok(()),
        }
    }

    /// Next SDK event. Pending forever when the SDK is not connected or its
    /// sender is gone.
    pub async fn next_event(&mut self) -> SdkEvent {
        loop {
            let next = match self.events.as_mut() {
                Some(rx) => rx.recv().await,
                None => return std::future::pending().await,
            };
            match next {
                Some(event) => return event,
                None => {
                    log::debug!("Playback SDK event channel closed");
                    self.events = None;
                }
            }
        }
    }

    /// Non-blocking variant of `next_event`.
    pub fn try_next_event(&mut self) -> Option<SdkEvent> {
        self.events.as_mut().and_then(|rx| rx.try_recv().ok())
    }
}

fn log_scopes(state: &TokenState) {
    let scopes: Vec<&str> = state.scopes.iter().map(String::as_str).collect();
    log::info!("Access token received with scopes: {}", scopes.join(" "));
}
