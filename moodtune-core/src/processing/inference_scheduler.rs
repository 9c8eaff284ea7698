use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::capture::manager::CaptureHandle;
use crate::models::config::DetectorOptions;
use crate::models::emotion::InferenceResult;
use crate::models::error::InferenceTickError;
use crate::models::state::SessionStatus;
use crate::traits::detector::ExpressionDetector;

type InferenceFuture = Pin<Box<dyn Future<Output = Result<InferenceResult, InferenceTickError>> + Send>>;

/// A completed inference, tagged with the activation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub generation: u64,
    pub result: InferenceResult,
    pub completed_at: DateTime<Utc>,
}

/// Counters for debugging the sampling loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerDiagnostics {
    pub activations: u64,
    pub ticks_fired: u64,
    pub inferences_started: u64,
    pub skipped_overlap: u64,
    pub skipped_inactive: u64,
    pub skipped_no_frame: u64,
    pub inference_errors: u64,
    pub reports_delivered: u64,
    pub reports_discarded: u64,
}

struct ActiveRun {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Periodic, cancellable expression sampling.
///
/// ```text
/// [ticker] → frame → [ExpressionDetector] → TickReport ─channel→ session
/// ```
/// At most one inference is in flight; ticks that fire meanwhile are
/// skipped. The scheduler owns both ends of the report channel, so reports
/// from an earlier activation can be recognized and dropped.
pub struct InferenceScheduler {
    detector: Arc<dyn ExpressionDetector>,
    options: DetectorOptions,
    period: Duration,
    reports_tx: mpsc::UnboundedSender<TickReport>,
    reports_rx: mpsc::UnboundedReceiver<TickReport>,
    active: Option<ActiveRun>,
    next_generation: u64,
    diagnostics: Arc<Mutex<SchedulerDiagnostics>>,
}

impl InferenceScheduler {
    pub fn new(detector: Arc<dyn ExpressionDetector>, options: DetectorOptions, period: Duration) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            detector,
            options,
            period,
            reports_tx,
            reports_rx,
            active: None,
            next_generation: 1,
            diagnostics: Arc::new(Mutex::new(SchedulerDiagnostics::default())),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|run| run.generation)
    }

    pub fn diagnostics(&self) -> SchedulerDiagnostics {
        self.diagnostics.lock().clone()
    }

    /// Start ticking. The first tick fires one period from now.
    ///
    /// Returns `false` (and changes nothing) if already active.
    pub fn activate(&mut self, frames: CaptureHandle, status: watch::Receiver<SessionStatus>) -> bool {
        if let Some(ref run) = self.active {
            log::debug!("Inference scheduler already active (generation {})", run.generation);
            return false;
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let cancel = CancellationToken::new();

        let tick_loop = TickLoop {
            generation,
            detector: Arc::clone(&self.detector),
            options: self.options.clone(),
            period: self.period,
            frames,
            status,
            reports: self.reports_tx.clone(),
            cancel: cancel.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        };
        let task = tokio::spawn(tick_loop.run());

        self.diagnostics.lock().activations += 1;
        log::info!(
            "Inference sampling every {:?} (generation {})",
            self.period,
            generation
        );
        self.active = Some(ActiveRun {
            generation,
            cancel,
            task,
        });
        true
    }

    /// Stop ticking and wait for the tick loop to exit.
    ///
    /// No tick fires after this returns and an in-flight inference is
    /// dropped. Reports that completed before the call and were still queued
    /// are returned so the caller can apply them; anything older is discarded.
    pub async fn deactivate(&mut self) -> Vec<TickReport> {
        let Some(run) = self.active.take() else {
            return Vec::new();
        };

        run.cancel.cancel();
        if let Err(e) = run.task.await {
            log::warn!("Inference tick loop ended abnormally: {}", e);
        }

        let mut completed = Vec::new();
        while let Ok(report) = self.reports_rx.try_recv() {
            if report.generation == run.generation {
                completed.push(report);
            } else {
                self.discard(&report);
            }
        }

        log::info!(
            "Inference sampling stopped (generation {}, {} pending report(s))",
            run.generation,
            completed.len()
        );
        completed
    }

    /// Next report from the current activation. Pending while inactive.
    pub async fn next_report(&mut self) -> TickReport {
        loop {
            let Some(report) = self.reports_rx.recv().await else {
                return std::future::pending().await;
            };
            if self.accepts(&report) {
                return report;
            }
            self.discard(&report);
        }
    }

    /// Non-blocking variant of `next_report`.
    pub fn try_next_report(&mut self) -> Option<TickReport> {
        while let Ok(report) = self.reports_rx.try_recv() {
            if self.accepts(&report) {
                return Some(report);
            }
            self.discard(&report);
        }
        None
    }

    fn accepts(&self, report: &TickReport) -> bool {
        self.current_generation() == Some(report.generation)
    }

    fn discard(&self, report: &TickReport) {
        log::debug!("Discarding stale tick report from generation {}", report.generation);
        self.diagnostics.lock().reports_discarded += 1;
    }
}

impl Drop for InferenceScheduler {
    fn drop(&mut self) {
        if let Some(run) = self.active.take() {
            run.cancel.cancel();
        }
    }
}

/// State moved into the spawned tick task.
struct TickLoop {
    generation: u64,
    detector: Arc<dyn ExpressionDetector>,
    options: DetectorOptions,
    period: Duration,
    frames: CaptureHandle,
    status: watch::Receiver<SessionStatus>,
    reports: mpsc::UnboundedSender<TickReport>,
    cancel: CancellationToken,
    diagnostics: Arc<Mutex<SchedulerDiagnostics>>,
}

impl TickLoop {
    async fn run(self) {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<InferenceFuture> = None;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = wait_in_flight(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    self.deliver(outcome);
                }
                _ = ticker.tick() => {
                    if let Some(inference) = self.on_tick(in_flight.is_some()) {
                        in_flight = Some(inference);
                    }
                }
            }
        }

        if in_flight.is_some() {
            log::debug!(
                "Dropping in-flight inference for generation {}",
                self.generation
            );
        }
    }

    fn on_tick(&self, busy: bool) -> Option<InferenceFuture> {
        let mut diag = self.diagnostics.lock();
        diag.ticks_fired += 1;

        if busy {
            diag.skipped_overlap += 1;
            log::debug!("Tick skipped: previous inference still running");
            return None;
        }
        if !self.status.borrow().is_capturing() {
            diag.skipped_inactive += 1;
            log::debug!("Tick skipped: session not capturing");
            return None;
        }
        let Some(frame) = self.frames.current_frame() else {
            diag.skipped_no_frame += 1;
            log::debug!("Tick skipped: no frame available");
            return None;
        };
        diag.inferences_started += 1;
        drop(diag);

        let detector = Arc::clone(&self.detector);
        let options = self.options.clone();
        Some(Box::pin(async move { detector.detect(&frame, &options).await }))
    }

    fn deliver(&self, outcome: Result<InferenceResult, InferenceTickError>) {
        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Inference tick failed, treating as no detection: {}", e);
                self.diagnostics.lock().inference_errors += 1;
                return;
            }
        };

        let report = TickReport {
            generation: self.generation,
            result,
            completed_at: Utc::now(),
        };
        if self.reports.send(report).is_ok() {
            self.diagnostics.lock().reports_delivered += 1;
        }
    }
}

async fn wait_in_flight(slot: &mut Option<InferenceFuture>) -> Result<InferenceResult, InferenceTickError> {
    match slot {
        Some(inference) => inference.await,
        None => std::future::pending().await,
    }
}
