use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    Nv12,
}

/// A single video frame handed to the expression detector.
///
/// Pixel data is shared, so cloning a frame is cheap.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Arc<[u8]>,
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            format,
            pixels: pixels.into(),
            captured_at: Utc::now(),
        }
    }
}
