//! In-memory collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use url::Url;

use crate::models::config::DetectorOptions;
use crate::models::emotion::{EmotionLabel, ExpressionScores, InferenceResult};
use crate::models::error::{
    CaptureError, InferenceTickError, PlaybackSdkError, RecommendationFetchError, SessionError,
};
use crate::models::frame::{PixelFormat, VideoFrame};
use crate::models::recommendation::{Recommendation, Track};
use crate::models::report::SessionReport;
use crate::models::state::SessionStatus;
use crate::traits::camera::{CameraDevice, CaptureConstraints, MediaStream, MediaTrack};
use crate::traits::detector::ExpressionDetector;
use crate::traits::navigator::Navigator;
use crate::traits::playback::{
    PlaybackController, PlaybackRequest, PlaybackSdk, PlayerOptions, SdkEvent,
};
use crate::traits::recommendation_source::RecommendationSource;
use crate::traits::session_delegate::SessionDelegate;

pub fn result_of(label: EmotionLabel, probability: f32) -> InferenceResult {
    InferenceResult::from_faces([ExpressionScores::new().with(label, probability)])
}

pub fn happy_over_sad() -> InferenceResult {
    InferenceResult::from_faces([ExpressionScores::new()
        .with(EmotionLabel::Happy, 0.9)
        .with(EmotionLabel::Sad, 0.1)])
}

// -- Camera --

pub struct FakeTrack {
    stopped: AtomicBool,
}

impl MediaTrack for FakeTrack {
    fn label(&self) -> String {
        "fake camera".into()
    }

    fn is_live(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

pub struct FakeStream {
    id: String,
    tracks: Vec<Arc<FakeTrack>>,
}

impl FakeStream {
    pub fn all_stopped(&self) -> bool {
        self.tracks.iter().all(|t| !t.is_live())
    }
}

impl MediaStream for FakeStream {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks
            .iter()
            .map(|t| Arc::clone(t) as Arc<dyn MediaTrack>)
            .collect()
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if self.all_stopped() {
            return None;
        }
        Some(VideoFrame::new(4, 4, PixelFormat::Rgba8, vec![0u8; 64]))
    }
}

pub struct FakeCamera {
    failure: Option<CaptureError>,
    opens: AtomicUsize,
    streams: Mutex<Vec<Arc<FakeStream>>>,
}

impl FakeCamera {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            opens: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: CaptureError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            opens: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn last_stream(&self) -> Option<Arc<FakeStream>> {
        self.streams.lock().last().cloned()
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    async fn open(&self, _constraints: &CaptureConstraints) -> Result<Arc<dyn MediaStream>, CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(ref error) = self.failure {
            return Err(error.clone());
        }
        let mut streams = self.streams.lock();
        let stream = Arc::new(FakeStream {
            id: format!("stream-{}", streams.len()),
            tracks: vec![Arc::new(FakeTrack {
                stopped: AtomicBool::new(false),
            })],
        });
        streams.push(Arc::clone(&stream));
        Ok(stream)
    }
}

// -- Detector --

pub enum Step {
    Ready(Result<InferenceResult, InferenceTickError>),
    /// Completes only after the notify is triggered.
    Held(Result<InferenceResult, InferenceTickError>, Arc<Notify>),
}

#[derive(Default)]
pub struct ScriptedDetector {
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    loads: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExpressionDetector for ScriptedDetector {
    async fn load(&self, _location: &Path) -> Result<(), InferenceTickError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn detect(
        &self,
        _frame: &VideoFrame,
        _options: &DetectorOptions,
    ) -> Result<InferenceResult, InferenceTickError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let step = self.script.lock().pop_front();
        let result = match step {
            None => Ok(InferenceResult::empty()),
            Some(Step::Ready(result)) => result,
            Some(Step::Held(result, gate)) => {
                gate.notified().await;
                result
            }
        };
        result
    }
}

// -- Recommendations --

pub struct FakeRecommendations {
    response: Result<Recommendation, RecommendationFetchError>,
    calls: Mutex<Vec<(EmotionLabel, String)>>,
}

impl FakeRecommendations {
    pub fn returning(uris: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(Recommendation {
                tracks: uris.iter().map(|u| Track::new(*u)).collect(),
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: RecommendationFetchError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(EmotionLabel, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RecommendationSource for FakeRecommendations {
    async fn fetch(
        &self,
        emotion: EmotionLabel,
        access_token: &str,
    ) -> Result<Recommendation, RecommendationFetchError> {
        self.calls.lock().push((emotion, access_token.to_string()));
        self.response.clone()
    }
}

// -- Playback --

#[derive(Default)]
pub struct RecordingPlayer {
    failure: Option<PlaybackSdkError>,
    requests: Mutex<Vec<PlaybackRequest>>,
}

impl RecordingPlayer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: PlaybackSdkError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<PlaybackRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl PlaybackController for RecordingPlayer {
    async fn play(&self, request: PlaybackRequest) -> Result<(), PlaybackSdkError> {
        self.requests.lock().push(request);
        match self.failure {
            Some(ref error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct FakeSdk {
    failure: Option<PlaybackSdkError>,
    connects: AtomicUsize,
    options: Mutex<Option<PlayerOptions>>,
    events: Mutex<Option<mpsc::UnboundedSender<SdkEvent>>>,
}

impl FakeSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(error: PlaybackSdkError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            ..Self::default()
        })
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> Option<PlayerOptions> {
        self.options.lock().clone()
    }

    /// Deliver an event as the SDK would. Returns false if not connected.
    pub fn emit(&self, event: SdkEvent) -> bool {
        match self.events.lock().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PlaybackSdk for FakeSdk {
    async fn connect(
        &self,
        options: PlayerOptions,
        events: mpsc::UnboundedSender<SdkEvent>,
    ) -> Result<(), PlaybackSdkError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(ref error) = self.failure {
            return Err(error.clone());
        }
        *self.options.lock() = Some(options);
        *self.events.lock() = Some(events);
        Ok(())
    }
}

// -- Navigation & delegate --

#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn visited(&self) -> Vec<Url> {
        self.visited.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &Url) {
        self.visited.lock().push(url.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DelegateEvent {
    Status(SessionStatus),
    Camera(bool),
    Emotion(EmotionLabel),
    Error(SessionError),
    Finished(SessionReport),
}

#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<DelegateEvent>>,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.lock().clone()
    }

    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<SessionError> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DelegateEvent::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_status_changed(&self, status: SessionStatus) {
        self.events.lock().push(DelegateEvent::Status(status));
    }

    fn on_camera_changed(&self, active: bool) {
        self.events.lock().push(DelegateEvent::Camera(active));
    }

    fn on_emotion_updated(&self, emotion: EmotionLabel) {
        self.events.lock().push(DelegateEvent::Emotion(emotion));
    }

    fn on_error(&self, error: &SessionError) {
        self.events.lock().push(DelegateEvent::Error(error.clone()));
    }

    fn on_session_finished(&self, report: &SessionReport) {
        self.events.lock().push(DelegateEvent::Finished(report.clone()));
    }
}
