use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::composite::compositor::CompositeFrame;
use crate::encode::sink::{FrameSink, SinkConfig, SinkReport};
use crate::encode::spherical::{StereoMode, inject_spherical_metadata};
use crate::foundation::core::{FrameIndex, FrameRate};
use crate::foundation::error::{CampathError, CampathResult};

/// Options for [`VideoSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct VideoSinkOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Overwrite output file if it already exists.
    pub overwrite: bool,
    /// x264 constant rate factor (0 = lossless, 51 = worst).
    pub crf: u8,
}

impl VideoSinkOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            crf: 18,
        }
    }
}

/// Running `ffmpeg` child bound to one frame geometry.
struct FfmpegWriter {
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
}

impl FfmpegWriter {
    fn spawn(opts: &VideoSinkOpts, width: u32, height: u32, rate: FrameRate) -> CampathResult<Self> {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if opts.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        // Input: raw rgb24 frames. yuv420p needs even dimensions, so odd sizes are padded by one
        // pixel on the right/bottom.
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &format!("{}/{}", rate.num, rate.den),
            "-i",
            "pipe:0",
            "-an",
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libx264",
            "-crf",
            &opts.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&opts.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            CampathError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CampathError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CampathError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(width, height, %rate, path = %opts.out_path.display(), "ffmpeg writer bound");
        Ok(Self {
            width,
            height,
            child: Some(child),
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
        })
    }

    fn write(&mut self, data: &[u8]) -> CampathResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CampathError::encode("ffmpeg writer is already closed"));
        };
        stdin.write_all(data).map_err(|e| {
            CampathError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    /// Close stdin so ffmpeg finalizes the container, then wait for it.
    fn close(&mut self) -> CampathResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child.wait().map_err(|e| {
            CampathError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| CampathError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| CampathError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(CampathError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if self.child.is_some()
            && let Err(e) = self.close()
        {
            tracing::warn!(error = %e, "ffmpeg writer closed on drop with error");
        }
    }
}

/// Lifecycle of the video writer.
enum WriterState {
    /// No frame received yet.
    Unbound,
    /// Writer running with a fixed geometry.
    Bound(FfmpegWriter),
    /// Finalized; no more frames accepted.
    Closed,
}

/// MP4 sink that spawns the system `ffmpeg` lazily on the first frame.
///
/// The writer is bound to the first frame's exact size; later frames must match. It is released
/// exactly once: by [`FrameSink::finish`], or by `Drop` when the sink is abandoned mid-run.
pub struct VideoSink {
    opts: VideoSinkOpts,
    cfg: Option<SinkConfig>,
    state: WriterState,
    frames_written: u64,
    last_idx: Option<FrameIndex>,
}

impl VideoSink {
    /// Create a new sink; nothing is spawned until the first frame.
    pub fn new(opts: VideoSinkOpts) -> Self {
        Self {
            opts,
            cfg: None,
            state: WriterState::Unbound,
            frames_written: 0,
            last_idx: None,
        }
    }

    /// `true` while an ffmpeg writer is running.
    pub fn is_bound(&self) -> bool {
        matches!(self.state, WriterState::Bound(_))
    }

    /// `true` once the sink has been finalized.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, WriterState::Closed)
    }

    /// Frame geometry the writer is bound to.
    pub fn geometry(&self) -> Option<(u32, u32)> {
        match &self.state {
            WriterState::Bound(w) => Some((w.width, w.height)),
            _ => None,
        }
    }

    fn tag_spherical(&self) {
        let Some(cfg) = self.cfg else { return };
        let stereo = if cfg.camera_model.is_omni_stereo() {
            StereoMode::TopBottom
        } else if cfg.camera_model.is_spherical() {
            StereoMode::Mono
        } else {
            return;
        };
        match inject_spherical_metadata(&self.opts.out_path, stereo) {
            Ok(()) => tracing::debug!(path = %self.opts.out_path.display(), "spherical metadata injected"),
            Err(e) => tracing::warn!(
                error = %e,
                path = %self.opts.out_path.display(),
                "failed to inject spherical metadata; video is still playable as flat"
            ),
        }
    }
}

impl FrameSink for VideoSink {
    fn prepare(&mut self, cfg: &SinkConfig) -> CampathResult<()> {
        if self.opts.crf > 51 {
            return Err(CampathError::malformed(format!(
                "crf must be in 0..=51, got {}",
                self.opts.crf
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(CampathError::resource(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(CampathError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }
        self.cfg = Some(*cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: CompositeFrame) -> CampathResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| CampathError::encode("video sink not prepared"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(CampathError::encode(
                "video sink received out-of-order frame index",
            ));
        }

        if matches!(self.state, WriterState::Unbound) {
            let writer =
                FfmpegWriter::spawn(&self.opts, frame.width(), frame.height(), cfg.frame_rate)?;
            self.state = WriterState::Bound(writer);
        }
        let WriterState::Bound(writer) = &mut self.state else {
            return Err(CampathError::encode("video sink is already finalized"));
        };

        if frame.width() != writer.width || frame.height() != writer.height {
            return Err(CampathError::shape(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                writer.width,
                writer.height
            )));
        }

        writer.write(frame.data())?;
        self.last_idx = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> CampathResult<SinkReport> {
        let geometry = self.geometry();
        match std::mem::replace(&mut self.state, WriterState::Closed) {
            WriterState::Closed => {
                return Err(CampathError::encode("video sink is already finalized"));
            }
            WriterState::Unbound => {
                tracing::warn!(
                    path = %self.opts.out_path.display(),
                    "video sink finalized without frames; no file written"
                );
            }
            WriterState::Bound(mut writer) => {
                writer.close()?;
                self.tag_spherical();
            }
        }
        Ok(SinkReport {
            location: self.opts.out_path.clone(),
            frames_written: self.frames_written,
            geometry,
        })
    }

    fn location(&self) -> &Path {
        &self.opts.out_path
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> CampathResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            CampathError::resource(format!(
                "failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
