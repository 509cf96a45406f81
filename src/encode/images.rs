use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use crate::composite::compositor::CompositeFrame;
use crate::encode::sink::{FrameSink, SinkConfig, SinkReport};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CampathError, CampathResult};

/// Digits used for frame numbers in file names.
pub const FRAME_NUMBER_WIDTH: usize = 5;

/// Image file encoding for [`ImageSequenceSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    /// Lossless PNG.
    Png,
    /// Lossy JPEG.
    Jpeg {
        /// 1 (smallest) to 100 (best).
        quality: u8,
    },
}

impl ImageEncoding {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    fn validate(self) -> CampathResult<()> {
        if let Self::Jpeg { quality } = self
            && !(1..=100).contains(&quality)
        {
            return Err(CampathError::malformed(format!(
                "jpeg quality must be in 1..=100, got {quality}"
            )));
        }
        Ok(())
    }
}

/// File name for frame `idx`, e.g. `00042.png`.
pub fn frame_file_name(idx: FrameIndex, encoding: ImageEncoding) -> String {
    format!(
        "{:0width$}.{}",
        idx.0,
        encoding.extension(),
        width = FRAME_NUMBER_WIDTH
    )
}

/// Writes each frame as its own numbered file in one directory.
#[derive(Debug)]
pub struct ImageSequenceSink {
    dir: PathBuf,
    encoding: ImageEncoding,
    frames_written: u64,
    geometry: Option<(u32, u32)>,
    finished: bool,
}

impl ImageSequenceSink {
    /// Sink writing into `dir` (created in `prepare`).
    pub fn new(dir: impl Into<PathBuf>, encoding: ImageEncoding) -> Self {
        Self {
            dir: dir.into(),
            encoding,
            frames_written: 0,
            geometry: None,
            finished: false,
        }
    }

    /// Path frame `idx` is written to.
    pub fn frame_path(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(frame_file_name(idx, self.encoding))
    }
}

impl FrameSink for ImageSequenceSink {
    fn prepare(&mut self, _cfg: &SinkConfig) -> CampathResult<()> {
        self.encoding.validate()?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CampathError::resource(format!(
                "failed to create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: CompositeFrame) -> CampathResult<()> {
        if self.finished {
            return Err(CampathError::encode("image sink is already finalized"));
        }
        if let Some((w, h)) = self.geometry
            && (frame.width(), frame.height()) != (w, h)
        {
            return Err(CampathError::shape(format!(
                "frame {} is {}x{}, sink is bound to {w}x{h}",
                idx.0,
                frame.width(),
                frame.height()
            )));
        }
        let path = self.frame_path(idx);
        match self.encoding {
            ImageEncoding::Png => image::save_buffer_with_format(
                &path,
                frame.data(),
                frame.width(),
                frame.height(),
                image::ColorType::Rgb8,
                image::ImageFormat::Png,
            )
            .map_err(|e| write_error(&path, e))?,
            ImageEncoding::Jpeg { quality } => {
                let f = File::create(&path).map_err(|e| {
                    CampathError::resource(format!("create '{}': {e}", path.display()))
                })?;
                let mut out = BufWriter::new(f);
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality)
                    .encode(
                        frame.data(),
                        frame.width(),
                        frame.height(),
                        image::ExtendedColorType::Rgb8,
                    )
                    .map_err(|e| write_error(&path, e))?;
                out.flush().map_err(|e| {
                    CampathError::resource(format!("write '{}': {e}", path.display()))
                })?;
            }
        }
        self.frames_written += 1;
        self.geometry.get_or_insert((frame.width(), frame.height()));
        Ok(())
    }

    fn finish(&mut self) -> CampathResult<SinkReport> {
        if self.finished {
            return Err(CampathError::encode("image sink is already finalized"));
        }
        self.finished = true;
        Ok(SinkReport {
            location: self.dir.clone(),
            frames_written: self.frames_written,
            geometry: self.geometry,
        })
    }

    fn location(&self) -> &Path {
        &self.dir
    }
}

// IO failures mean the destination went away or is read-only; anything else is the codec.
fn write_error(path: &Path, err: image::ImageError) -> CampathError {
    match err {
        image::ImageError::IoError(e) => {
            CampathError::resource(format!("write '{}': {e}", path.display()))
        }
        other => CampathError::encode(format!("encode '{}': {other}", path.display())),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/images.rs"]
mod tests;
