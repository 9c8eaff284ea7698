use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::auth::token_lifecycle::TokenLifecycle;
use crate::capture::manager::CaptureManager;
use crate::models::config::SessionConfig;
use crate::models::emotion::EmotionLabel;
use crate::models::error::SessionError;
use crate::models::recommendation::Recommendation;
use crate::models::report::{
    HandoffOutcome, RecommendationStatus, SessionReport, SessionSnapshot, StartOutcome,
};
use crate::models::state::{Session, SessionStatus};
use crate::processing::emotion_aggregator::EmotionAggregator;
use crate::processing::inference_scheduler::{InferenceScheduler, SchedulerDiagnostics, TickReport};
use crate::recommendation::handoff::PlaybackHandoff;
use crate::traits::camera::CameraDevice;
use crate::traits::detector::ExpressionDetector;
use crate::traits::navigator::Navigator;
use crate::traits::playback::{PlaybackController, PlaybackSdk, SdkEvent};
use crate::traits::recommendation_source::RecommendationSource;
use crate::traits::session_delegate::SessionDelegate;

/// External collaborators the state machine drives.
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<dyn CameraDevice>,
    pub detector: Arc<dyn ExpressionDetector>,
    pub recommendations: Arc<dyn RecommendationSource>,
    pub sdk: Arc<dyn PlaybackSdk>,
    pub player: Arc<dyn PlaybackController>,
    pub navigator: Arc<dyn Navigator>,
}

/// Input the state machine waits on between commands.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineEvent {
    Tick(TickReport),
    Sdk(SdkEvent),
}

/// Top-level session coordinator.
///
/// ```text
/// start: [CaptureManager] → acquire ─→ Capturing ─→ [InferenceScheduler] activate
/// tick:  TickReport ─→ [EmotionAggregator] ─→ Session.last_emotion
/// stop:  deactivate (barrier) → release camera → fetch(emotion, token) → [PlaybackHandoff] → Idle
/// ```
/// Every mutation goes through `&mut self`, so a single owner (the
/// controller loop or a test) serializes commands, ticks and SDK events.
pub struct SessionStateMachine {
    config: SessionConfig,
    session: Session,
    status_tx: watch::Sender<SessionStatus>,
    capture: CaptureManager,
    scheduler: InferenceScheduler,
    tokens: TokenLifecycle,
    detector: Arc<dyn ExpressionDetector>,
    recommendations: Arc<dyn RecommendationSource>,
    handoff: PlaybackHandoff,
    sdk: Arc<dyn PlaybackSdk>,
    navigator: Arc<dyn Navigator>,
    delegate: Option<Arc<dyn SessionDelegate>>,
    models_loaded: bool,
}

impl SessionStateMachine {
    pub fn new(config: SessionConfig, parts: Collaborators, tokens: TokenLifecycle) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Idle);
        let scheduler = InferenceScheduler::new(
            Arc::clone(&parts.detector),
            config.detector.clone(),
            config.tick_interval(),
        );
        Self {
            session: Session::idle(),
            status_tx,
            capture: CaptureManager::new(parts.camera),
            scheduler,
            tokens,
            detector: parts.detector,
            recommendations: parts.recommendations,
            handoff: PlaybackHandoff::new(parts.player),
            sdk: parts.sdk,
            navigator: parts.navigator,
            delegate: None,
            models_loaded: false,
            config,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn last_emotion(&self) -> Option<EmotionLabel> {
        self.session.last_emotion
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn tokens(&self) -> &TokenLifecycle {
        &self.tokens
    }

    pub fn camera_active(&self) -> bool {
        self.capture.is_active()
    }

    pub fn scheduler_diagnostics(&self) -> SchedulerDiagnostics {
        self.scheduler.diagnostics()
    }

    /// Status updates for UI consumers.
    pub fn subscribe_status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let tokens = self.tokens.state();
        SessionSnapshot {
            session_id: (!self.session.status.is_idle()).then_some(self.session.id),
            status: self.session.status,
            last_emotion: self.session.last_emotion,
            camera_active: self.capture.is_active(),
            authorized: tokens.is_authorized(),
            sdk_ready: tokens.sdk_ready,
            device_id: tokens.device_id.clone(),
        }
    }

    /// One-time bring-up: load the expression models and, if a token is
    /// already present, connect the playback SDK. Safe to call repeatedly.
    pub async fn prepare(&mut self) {
        if !self.models_loaded {
            let location = self.config.model_location.clone();
            match self.detector.load(&location).await {
                Ok(()) => {
                    log::info!("Expression models loaded from {}", location.display());
                    self.models_loaded = true;
                }
                Err(e) => {
                    log::error!("Failed to load expression models: {}", e);
                    self.report_error(&SessionError::InferenceTick(e));
                }
            }
        }
        self.ensure_playback_sdk().await;
    }

    /// Connect the SDK if a token exists and it has not been started yet.
    pub async fn ensure_playback_sdk(&mut self) {
        if !self.tokens.needs_sdk() {
            return;
        }
        if let Err(e) = self
            .tokens
            .initialize_sdk(self.sdk.as_ref(), &self.config.player)
            .await
        {
            self.report_error(&SessionError::PlaybackSdk(e));
        }
    }

    /// Send the user to the authorization endpoint.
    pub fn authorize(&self) {
        self.tokens.authorize(self.navigator.as_ref());
    }

    /// Feed a redirect callback that arrived after startup. Brings the SDK
    /// up when it delivers the first token.
    pub async fn accept_callback(&mut self, query: &str) -> bool {
        let accepted = self.tokens.accept_callback(query);
        if accepted {
            self.ensure_playback_sdk().await;
        }
        accepted
    }

    /// Idle → Capturing. No-op while already capturing.
    pub async fn start(&mut self) -> Result<StartOutcome, SessionError> {
        if self.session.status.is_capturing() {
            log::debug!("Start ignored: session {} already capturing", self.session.id);
            return Ok(StartOutcome::AlreadyCapturing {
                session_id: self.session.id,
            });
        }

        let handle = match self.capture.start().await {
            Ok(handle) => handle,
            Err(e) => {
                let error = SessionError::CaptureUnavailable(e);
                self.report_error(&error);
                self.session.reset();
                return Err(error);
            }
        };
        self.notify_camera(true);

        self.session = Session::begin();
        self.set_status(SessionStatus::Capturing);
        self.scheduler.activate(handle, self.status_tx.subscribe());

        log::info!("Session {} started", self.session.id);
        Ok(StartOutcome::Started {
            session_id: self.session.id,
        })
    }

    /// Capturing → Stopped → Idle.
    ///
    /// Rejected while no emotion has been detected; the session then keeps
    /// capturing. Otherwise sampling is halted before the emotion is read,
    /// the camera is released, and the recommendation is fetched and handed
    /// off once.
    pub async fn stop(&mut self) -> Result<SessionReport, SessionError> {
        if !self.session.status.is_capturing() {
            return Err(SessionError::NotCapturing);
        }
        let Some(mut emotion) = self.session.last_emotion else {
            log::info!("Stop rejected for session {}: no emotion detected yet", self.session.id);
            return Err(SessionError::NoEmotionDetected);
        };

        // Ticks finished before the barrier still count; in-flight ones are dropped.
        for report in self.scheduler.deactivate().await {
            self.apply_result(&report);
        }
        if let Some(latest) = self.session.last_emotion {
            emotion = latest;
        }
        self.set_status(SessionStatus::Stopped);

        if self.capture.stop() {
            self.notify_camera(false);
        }

        let (recommendation, playback) = self.recommend_and_play(emotion).await;

        let report = SessionReport {
            session_id: self.session.id,
            emotion,
            started_at: self.session.started_at,
            stopped_at: Utc::now(),
            ticks_applied: self.session.ticks_applied,
            recommendation,
            playback,
        };
        log::info!(
            "Session {} stopped on {} ({} tick(s) applied)",
            report.session_id,
            report.emotion,
            report.ticks_applied
        );
        if let Some(ref delegate) = self.delegate {
            delegate.on_session_finished(&report);
        }

        self.session.reset();
        self.set_status(SessionStatus::Idle);
        Ok(report)
    }

    /// Wait for the next tick report or SDK event.
    pub async fn next_event(&mut self) -> MachineEvent {
        tokio::select! {
            report = self.scheduler.next_report() => MachineEvent::Tick(report),
            event = self.tokens.next_event() => MachineEvent::Sdk(event),
        }
    }

    pub fn process(&mut self, event: MachineEvent) {
        match event {
            MachineEvent::Tick(report) => {
                self.apply_tick(report);
            }
            MachineEvent::Sdk(event) => self.handle_sdk_event(event),
        }
    }

    /// Apply every queued tick report. Returns how many were processed.
    pub fn drain_ticks(&mut self) -> usize {
        let mut processed = 0;
        while let Some(report) = self.scheduler.try_next_report() {
            self.apply_tick(report);
            processed += 1;
        }
        processed
    }

    /// Apply every queued SDK event. Returns how many were processed.
    pub fn drain_sdk_events(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.tokens.try_next_event() {
            self.handle_sdk_event(event);
            processed += 1;
        }
        processed
    }

    pub fn handle_sdk_event(&mut self, event: SdkEvent) {
        if let Err(e) = self.tokens.handle_event(event) {
            self.report_error(&SessionError::PlaybackSdk(e));
        }
    }

    /// Release everything without fetching recommendations.
    pub async fn shutdown(&mut self) {
        if self.scheduler.is_active() {
            let dropped = self.scheduler.deactivate().await;
            if !dropped.is_empty() {
                log::debug!("Dropping {} tick report(s) at shutdown", dropped.len());
            }
        }
        if self.capture.stop() {
            self.notify_camera(false);
        }
        if !self.session.status.is_idle() {
            log::info!("Session {} abandoned at shutdown", self.session.id);
            self.session.reset();
            self.set_status(SessionStatus::Idle);
        }
    }

    // --- Internal helpers ---

    fn apply_tick(&mut self, report: TickReport) -> Option<EmotionLabel> {
        if self.scheduler.current_generation() != Some(report.generation) {
            log::debug!("Ignoring tick report from generation {}", report.generation);
            return None;
        }
        self.apply_result(&report)
    }

    fn apply_result(&mut self, report: &TickReport) -> Option<EmotionLabel> {
        if !self.session.status.is_capturing() {
            log::debug!("Ignoring tick report outside capturing");
            return None;
        }
        let emotion = EmotionAggregator::apply(&report.result, &mut self.session)?;
        log::debug!("Session {} emotion now {}", self.session.id, emotion);
        if let Some(ref delegate) = self.delegate {
            delegate.on_emotion_updated(emotion);
        }
        Some(emotion)
    }

    async fn recommend_and_play(&mut self, emotion: EmotionLabel) -> (RecommendationStatus, HandoffOutcome) {
        let Some(token) = self.tokens.access_token().map(str::to_string) else {
            log::warn!("No access token; skipping recommendations for {}", emotion);
            return (RecommendationStatus::NotAuthorized, HandoffOutcome::Skipped);
        };

        let (status, recommendation) = match self.recommendations.fetch(emotion, &token).await {
            Ok(recommendation) => (
                RecommendationStatus::Received {
                    track_count: recommendation.len(),
                },
                recommendation,
            ),
            Err(e) => {
                log::warn!("No recommendations available: {}", e);
                let status = RecommendationStatus::Unavailable {
                    reason: e.to_string(),
                };
                self.report_error(&SessionError::RecommendationFetch(e));
                (status, Recommendation::empty())
            }
        };

        let (playback, error) = self
            .handoff
            .hand_off(&recommendation, &token, self.tokens.device_id())
            .await;
        if let Some(e) = error {
            self.report_error(&SessionError::PlaybackSdk(e));
        }
        (status, playback)
    }

    fn set_status(&mut self, status: SessionStatus) {
        self.session.status = status;
        self.status_tx.send_replace(status);
        if let Some(ref delegate) = self.delegate {
            delegate.on_status_changed(status);
        }
    }

    fn notify_camera(&self, active: bool) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_camera_changed(active);
        }
    }

    fn report_error(&self, error: &SessionError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}
