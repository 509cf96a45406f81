use std::path::PathBuf;
use std::time::Duration;

use crate::foundation::core::FrameRate;
use crate::foundation::error::CampathError;

/// Emitted once per completed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Frames pushed to the sink so far.
    pub frames_done: u64,
    /// Frames in the trajectory.
    pub frames_total: u64,
    /// Wall time since the first frame started.
    pub elapsed: Duration,
    /// Estimated time remaining at the current throughput.
    pub eta: Duration,
    /// Average frames per second so far.
    pub fps: f64,
}

impl ProgressEvent {
    pub(crate) fn new(frames_done: u64, frames_total: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let fps = if secs > 0.0 {
            frames_done as f64 / secs
        } else {
            0.0
        };
        let remaining = frames_total.saturating_sub(frames_done);
        let eta = if fps > 0.0 {
            Duration::from_secs_f64(remaining as f64 / fps)
        } else {
            Duration::ZERO
        };
        Self {
            frames_done,
            frames_total,
            elapsed,
            eta,
            fps,
        }
    }
}

/// What a completed run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    /// Output file or directory.
    pub location: PathBuf,
    /// Frames accepted by the sink.
    pub frames_written: u64,
    /// Playback rate of the output.
    pub frame_rate: FrameRate,
    /// `(width, height)` of every written frame.
    pub geometry: Option<(u32, u32)>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
    /// Frames that were composited without at least one requested channel.
    pub frames_with_missing_channels: u64,
}

/// Receives run progress. Injected into the driver; there is no global progress state.
pub trait ProgressObserver {
    /// A frame was written.
    fn report_progress(&mut self, event: &ProgressEvent);
    /// A non-fatal problem, or the error that is about to abort the run.
    fn report_error(&mut self, error: &CampathError);
    /// The run finished and the sink is closed.
    fn report_summary(&mut self, summary: &RenderSummary);
}

/// Logs progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn report_progress(&mut self, event: &ProgressEvent) {
        tracing::info!(
            done = event.frames_done,
            total = event.frames_total,
            fps = event.fps,
            eta_s = event.eta.as_secs(),
            "frame written"
        );
    }

    fn report_error(&mut self, error: &CampathError) {
        if error.is_soft() {
            tracing::warn!(%error, "frame composited with missing channel");
        } else {
            tracing::error!(%error, "render aborted");
        }
    }

    fn report_summary(&mut self, summary: &RenderSummary) {
        tracing::info!(
            location = %summary.location.display(),
            frames = summary.frames_written,
            frame_rate = %summary.frame_rate,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "render finished"
        );
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn report_progress(&mut self, _event: &ProgressEvent) {}
    fn report_error(&mut self, _error: &CampathError) {}
    fn report_summary(&mut self, _summary: &RenderSummary) {}
}

/// Records every callback; used by tests and embedders that poll progress.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    /// Progress events in arrival order.
    pub progress: Vec<ProgressEvent>,
    /// Display strings of reported errors.
    pub errors: Vec<String>,
    /// Summary, once the run completed.
    pub summary: Option<RenderSummary>,
}

impl ProgressObserver for RecordingObserver {
    fn report_progress(&mut self, event: &ProgressEvent) {
        self.progress.push(*event);
    }

    fn report_error(&mut self, error: &CampathError) {
        self.errors.push(error.to_string());
    }

    fn report_summary(&mut self, summary: &RenderSummary) {
        self.summary = Some(summary.clone());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/observer.rs"]
mod tests;
