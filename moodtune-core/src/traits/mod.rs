pub mod camera;
pub mod detector;
pub mod navigator;
pub mod playback;
pub mod recommendation_source;
pub mod session_delegate;
