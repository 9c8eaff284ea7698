use std::sync::Arc;

use async_trait::async_trait;

use crate::models::error::CaptureError;
use crate::models::frame::VideoFrame;

/// Requested capture parameters. `None` lets the device pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub device_id: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A hardware track inside a media stream (one camera sensor).
pub trait MediaTrack: Send + Sync {
    fn label(&self) -> String;

    /// Whether the track is still delivering frames.
    fn is_live(&self) -> bool;

    /// Stop the track and release the underlying hardware. Idempotent.
    fn stop(&self);
}

/// An acquired camera stream.
///
/// Only `CaptureManager` holds the stream itself; everyone else reads
/// frames through a `CaptureHandle`.
pub trait MediaStream: Send + Sync {
    fn id(&self) -> String;

    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>>;

    /// Most recent frame, or `None` when no frame is available yet or the
    /// tracks were stopped.
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// Interface for platform-specific camera sources.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Acquire a video stream. Suspends while the platform asks for
    /// permission or opens the device.
    ///
    /// Fails with `PermissionDenied`, `DeviceNotAvailable` or `DeviceBusy`
    /// when the camera cannot be used.
    async fn open(&self, constraints: &CaptureConstraints) -> Result<Arc<dyn MediaStream>, CaptureError>;
}
