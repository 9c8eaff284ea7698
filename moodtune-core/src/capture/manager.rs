use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::frame::VideoFrame;
use crate::traits::camera::{CameraDevice, CaptureConstraints, MediaStream};

/// Read-only view of the active camera stream.
///
/// Lets the inference scheduler pull frames without being able to stop
/// tracks; releasing hardware is reserved to `CaptureManager`.
#[derive(Clone)]
pub struct CaptureHandle {
    stream: Arc<dyn MediaStream>,
}

impl CaptureHandle {
    pub fn stream_id(&self) -> String {
        self.stream.id()
    }

    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.stream.current_frame()
    }
}

impl std::fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("stream_id", &self.stream.id())
            .finish()
    }
}

/// Owns the camera stream for the lifetime of a session.
///
/// `start` and `stop` are idempotent. The camera-active flag mirrors whether
/// a stream is currently held.
pub struct CaptureManager {
    camera: Arc<dyn CameraDevice>,
    constraints: CaptureConstraints,
    stream: Option<Arc<dyn MediaStream>>,
    camera_active: Arc<AtomicBool>,
}

impl CaptureManager {
    pub fn new(camera: Arc<dyn CameraDevice>) -> Self {
        Self::with_constraints(camera, CaptureConstraints::default())
    }

    pub fn with_constraints(camera: Arc<dyn CameraDevice>, constraints: CaptureConstraints) -> Self {
        Self {
            camera,
            constraints,
            stream: None,
            camera_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.camera_active.load(Ordering::SeqCst)
    }

    /// Shared flag for observers that outlive a borrow of the manager.
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.camera_active)
    }

    /// Acquire the camera, or return the existing handle if already active.
    pub async fn start(&mut self) -> Result<CaptureHandle, CaptureError> {
        if let Some(ref stream) = self.stream {
            return Ok(CaptureHandle {
                stream: Arc::clone(stream),
            });
        }

        let stream = match self.camera.open(&self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                log::error!("Failed to acquire camera: {}", e);
                return Err(e);
            }
        };

        log::info!(
            "Camera acquired: stream {} with {} track(s)",
            stream.id(),
            stream.tracks().len()
        );
        self.stream = Some(Arc::clone(&stream));
        self.camera_active.store(true, Ordering::SeqCst);
        Ok(CaptureHandle { stream })
    }

    /// Stop every hardware track and drop the stream.
    ///
    /// Returns `false` when there was nothing to release.
    pub fn stop(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            return false;
        };

        for track in stream.tracks() {
            track.stop();
        }
        self.camera_active.store(false, Ordering::SeqCst);
        log::info!("Camera released: stream {}", stream.id());
        true
    }
}

impl Drop for CaptureManager {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCamera;

    #[tokio::test]
    async fn start_is_idempotent() {
        let camera = FakeCamera::working();
        let mut manager = CaptureManager::new(camera.clone());

        let first = manager.start().await.unwrap();
        let second = manager.start().await.unwrap();

        assert_eq!(camera.opens(), 1);
        assert_eq!(first.stream_id(), second.stream_id());
        assert!(manager.is_active());
    }

    #[tokio::test]
    async fn stop_releases_tracks_and_is_idempotent() {
        let camera = FakeCamera::working();
        let mut manager = CaptureManager::new(camera.clone());
        let handle = manager.start().await.unwrap();
        assert!(handle.current_frame().is_some());

        assert!(manager.stop());
        assert!(!manager.is_active());
        assert!(camera.last_stream().unwrap().all_stopped());
        assert!(handle.current_frame().is_none());

        assert!(!manager.stop());
    }

    #[tokio::test]
    async fn failed_acquisition_leaves_camera_inactive() {
        let camera = FakeCamera::failing(CaptureError::PermissionDenied);
        let mut manager = CaptureManager::new(camera.clone());

        let err = manager.start().await.unwrap_err();
        assert_eq!(err, CaptureError::PermissionDenied);
        assert!(!manager.is_active());
        assert!(!manager.stop());
    }

    #[tokio::test]
    async fn restart_after_stop_opens_new_stream() {
        let camera = FakeCamera::working();
        let mut manager = CaptureManager::new(camera.clone());

        let first = manager.start().await.unwrap().stream_id();
        manager.stop();
        let second = manager.start().await.unwrap().stream_id();

        assert_eq!(camera.opens(), 2);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn drop_releases_camera() {
        let camera = FakeCamera::working();
        {
            let mut manager = CaptureManager::new(camera.clone());
            manager.start().await.unwrap();
        }
        assert!(camera.last_stream().unwrap().all_stopped());
    }

    #[tokio::test]
    async fn shared_flag_follows_stream() {
        let mut manager = CaptureManager::new(FakeCamera::working());
        let flag = manager.active_flag();
        assert!(!flag.load(Ordering::SeqCst));

        manager.start().await.unwrap();
        assert!(flag.load(Ordering::SeqCst));

        drop(manager);
        assert!(!flag.load(Ordering::SeqCst));
    }
}
