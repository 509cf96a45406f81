use std::path::{Path, PathBuf};

use crate::camera::model::CameraModel;
use crate::composite::compositor::CompositeFrame;
use crate::encode::ffmpeg::{VideoSink, VideoSinkOpts};
use crate::encode::images::{ImageEncoding, ImageSequenceSink};
use crate::foundation::core::{FrameIndex, FrameRate};
use crate::foundation::error::{CampathError, CampathResult};

/// Run-level facts handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkConfig {
    /// Playback rate of the output.
    pub frame_rate: FrameRate,
    /// Number of frames the run will push.
    pub frame_count: u64,
    /// Projection of the trajectory being rendered.
    pub camera_model: CameraModel,
}

/// What a sink produced once finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkReport {
    /// Output file or directory.
    pub location: PathBuf,
    /// Frames accepted by the sink.
    pub frames_written: u64,
    /// `(width, height)` of the written frames, if any were written.
    pub geometry: Option<(u32, u32)>,
}

/// Destination for composited frames.
///
/// Call order contract: `prepare` once, `push_frame` in strictly increasing index order, then
/// `finish` exactly once, including after a failed `push_frame`.
pub trait FrameSink {
    /// Create destination directories and validate options. No frame has been rendered yet.
    fn prepare(&mut self, cfg: &SinkConfig) -> CampathResult<()>;
    /// Take ownership of one frame and write it.
    fn push_frame(&mut self, idx: FrameIndex, frame: CompositeFrame) -> CampathResult<()>;
    /// Flush and release the output resource.
    fn finish(&mut self) -> CampathResult<SinkReport>;
    /// Output file or directory.
    fn location(&self) -> &Path;
}

/// Output mode, chosen once per run.
#[derive(Debug, Clone)]
pub enum SinkKind {
    /// Single MP4 container written through `ffmpeg`.
    Video(VideoSinkOpts),
    /// Directory of numbered image files.
    Images {
        /// Output directory.
        dir: PathBuf,
        /// File encoding.
        encoding: ImageEncoding,
    },
}

/// Build the sink for `kind`.
pub fn create_sink(kind: SinkKind) -> Box<dyn FrameSink> {
    match kind {
        SinkKind::Video(opts) => Box::new(VideoSink::new(opts)),
        SinkKind::Images { dir, encoding } => Box::new(ImageSequenceSink::new(dir, encoding)),
    }
}

/// In-memory sink for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, CompositeFrame)>,
    finish_calls: u32,
    fail_at: Option<FrameIndex>,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects the frame with index `idx` (and accepts the ones before it).
    pub fn failing_at(idx: FrameIndex) -> Self {
        Self {
            fail_at: Some(idx),
            ..Self::default()
        }
    }

    /// Configuration captured in `prepare`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in push order.
    pub fn frames(&self) -> &[(FrameIndex, CompositeFrame)] {
        &self.frames
    }

    /// How many times `finish` was called.
    pub fn finish_calls(&self) -> u32 {
        self.finish_calls
    }
}

impl FrameSink for InMemorySink {
    fn prepare(&mut self, cfg: &SinkConfig) -> CampathResult<()> {
        self.cfg = Some(*cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: CompositeFrame) -> CampathResult<()> {
        if self.finish_calls > 0 {
            return Err(CampathError::encode("in-memory sink is already finalized"));
        }
        if self.fail_at == Some(idx) {
            return Err(CampathError::encode(format!(
                "in-memory sink rejected frame {}",
                idx.0
            )));
        }
        self.frames.push((idx, frame));
        Ok(())
    }

    fn finish(&mut self) -> CampathResult<SinkReport> {
        self.finish_calls += 1;
        Ok(SinkReport {
            location: self.location().to_path_buf(),
            frames_written: self.frames.len() as u64,
            geometry: self.frames.first().map(|(_, f)| (f.width(), f.height())),
        })
    }

    fn location(&self) -> &Path {
        Path::new("<memory>")
    }
}
