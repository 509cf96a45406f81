//! Output sinks.
//!
//! Sinks consume composited frames in trajectory order and own the output resource.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Numbered image-file sink.
pub mod images;
/// Frame sink trait and the in-memory sink.
pub mod sink;
/// Spherical-video metadata injection for MP4 files.
pub mod spherical;
