use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::composite::colormap::ColormapOptions;
use crate::composite::compositor::{Composited, composite_frame};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, FrameRate};
use crate::foundation::error::{CampathError, CampathResult};
use crate::render::backend::SceneRenderer;
use crate::render::crop::{CropContext, CropSpec};
use crate::render::frame::FrameRenderer;
use crate::session::observer::{ProgressEvent, ProgressObserver, RenderSummary};
use crate::trajectory::builder::Trajectory;

/// What to do when a requested channel is absent from a frame's outputs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MissingChannelPolicy {
    /// Report the channel and composite the ones that were found.
    #[default]
    Skip,
    /// Abort the run.
    Fail,
}

/// Where a run currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Constructed, not started.
    Idle,
    /// Creating destinations.
    PreparingSink,
    /// Waiting on the scene renderer.
    RenderingFrame(FrameIndex),
    /// Mapping channels into a display frame.
    Compositing(FrameIndex),
    /// Handing the frame to the sink.
    Writing(FrameIndex),
    /// Closing the sink.
    Finalizing,
    /// Sink closed after a complete run.
    Done,
    /// Sink closed after an error or cancellation.
    Aborted,
}

/// Options for one trajectory render.
#[derive(Clone, Debug)]
pub struct DriverOpts {
    /// Channels to composite, left to right.
    pub channels: Vec<String>,
    /// Channel to RGB mapping.
    pub colormap: ColormapOptions,
    /// Handling of requested channels the renderer did not produce.
    pub missing_channel: MissingChannelPolicy,
    /// Output duration; frame rate is `frame_count / seconds`.
    pub seconds: f64,
    /// Crop box applied identically to every frame.
    pub crop: Option<CropSpec>,
    /// Checked before each frame; when set the run stops with [`CampathError::Interrupted`].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for DriverOpts {
    fn default() -> Self {
        Self {
            channels: vec!["rgb".to_owned()],
            colormap: ColormapOptions::default(),
            missing_channel: MissingChannelPolicy::default(),
            seconds: 5.0,
            crop: None,
            cancel: None,
        }
    }
}

impl DriverOpts {
    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }

    fn crop_context(&self) -> CampathResult<Option<CropContext>> {
        self.crop.as_ref().map(CropContext::from_spec).transpose()
    }
}

/// Sequential render loop: one frame at a time, in trajectory order, into one sink.
///
/// The sink is finished exactly once per [`TrajectoryDriver::run`], whether the run completes,
/// fails, or is cancelled. On failure the first error is returned; a close error that follows it
/// is only logged.
pub struct TrajectoryDriver<'a> {
    renderer: FrameRenderer<'a>,
    sink: &'a mut dyn FrameSink,
    observer: &'a mut dyn ProgressObserver,
    opts: DriverOpts,
    state: DriverState,
}

impl<'a> TrajectoryDriver<'a> {
    /// Bind the collaborators for one run.
    pub fn new(
        renderer: &'a mut dyn SceneRenderer,
        sink: &'a mut dyn FrameSink,
        observer: &'a mut dyn ProgressObserver,
        opts: DriverOpts,
    ) -> Self {
        Self {
            renderer: FrameRenderer::new(renderer),
            sink,
            observer,
            opts,
            state: DriverState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    fn transition(&mut self, next: DriverState) {
        tracing::debug!(from = ?self.state, to = ?next, "driver state");
        self.state = next;
    }

    /// Render every frame of `traj` into the sink.
    ///
    /// Options are validated before the sink is touched, so malformed input leaves no output.
    #[tracing::instrument(skip_all, fields(frames = traj.len(), model = ?traj.model()))]
    pub fn run(&mut self, traj: &Trajectory) -> CampathResult<RenderSummary> {
        let started = Instant::now();

        if self.opts.channels.is_empty() {
            return Err(CampathError::malformed("no output channels requested"));
        }
        let crop = self.opts.crop_context()?;
        let frame_count = traj.len() as u64;
        let frame_rate = FrameRate::from_duration(frame_count, self.opts.seconds)?;
        let cfg = SinkConfig {
            frame_rate,
            frame_count,
            camera_model: traj.model(),
        };

        let rendered = self.render_frames(traj, crop.as_ref(), &cfg, started);

        self.transition(DriverState::Finalizing);
        let finished = self.sink.finish();

        match (rendered, finished) {
            (Ok(frames_with_missing_channels), Ok(report)) => {
                self.transition(DriverState::Done);
                let summary = RenderSummary {
                    location: report.location,
                    frames_written: report.frames_written,
                    frame_rate,
                    geometry: report.geometry,
                    elapsed: started.elapsed(),
                    frames_with_missing_channels,
                };
                self.observer.report_summary(&summary);
                Ok(summary)
            }
            (Ok(_), Err(e)) => Err(self.abort(e)),
            (Err(e), Ok(_)) => Err(self.abort(e)),
            (Err(e), Err(close)) => {
                tracing::warn!(error = %close, "sink finalization failed after abort");
                Err(self.abort(e))
            }
        }
    }

    fn abort(&mut self, error: CampathError) -> CampathError {
        self.transition(DriverState::Aborted);
        self.observer.report_error(&error);
        error
    }

    /// Returns how many frames lacked at least one requested channel.
    fn render_frames(
        &mut self,
        traj: &Trajectory,
        crop: Option<&CropContext>,
        cfg: &SinkConfig,
        started: Instant,
    ) -> CampathResult<u64> {
        self.transition(DriverState::PreparingSink);
        self.sink.prepare(cfg)?;

        let mut frames_with_missing = 0u64;
        for (i, view) in traj.views().enumerate() {
            let idx = FrameIndex(i as u64);
            if self.opts.cancelled() {
                return Err(CampathError::Interrupted);
            }

            self.transition(DriverState::RenderingFrame(idx));
            let outputs = self.renderer.render(&view, crop)?;

            self.transition(DriverState::Compositing(idx));
            let composited =
                composite_frame(&outputs, &self.opts.channels, &self.opts.colormap)?;
            if self.check_missing(&composited)? {
                frames_with_missing += 1;
            }

            self.transition(DriverState::Writing(idx));
            self.sink.push_frame(idx, composited.frame)?;

            self.observer.report_progress(&ProgressEvent::new(
                idx.0 + 1,
                cfg.frame_count,
                started.elapsed(),
            ));
        }
        Ok(frames_with_missing)
    }

    /// Apply the missing-channel policy; `Ok(true)` when something was skipped.
    fn check_missing(&mut self, composited: &Composited) -> CampathResult<bool> {
        for name in &composited.missing {
            let err = CampathError::channel_not_found(name.clone(), composited.available.clone());
            match self.opts.missing_channel {
                MissingChannelPolicy::Fail => return Err(err),
                MissingChannelPolicy::Skip => self.observer.report_error(&err),
            }
        }
        Ok(!composited.missing.is_empty())
    }
}

/// Run a [`TrajectoryDriver`] once.
pub fn render_trajectory(
    traj: &Trajectory,
    renderer: &mut dyn SceneRenderer,
    sink: &mut dyn FrameSink,
    opts: DriverOpts,
    observer: &mut dyn ProgressObserver,
) -> CampathResult<RenderSummary> {
    TrajectoryDriver::new(renderer, sink, observer, opts).run(traj)
}

/// Render and composite a single frame of `traj` without a sink.
///
/// Missing channels follow `opts.missing_channel`, as in a full run.
pub fn render_single_frame(
    traj: &Trajectory,
    index: FrameIndex,
    renderer: &mut dyn SceneRenderer,
    opts: &DriverOpts,
) -> CampathResult<Composited> {
    let view = usize::try_from(index.0)
        .ok()
        .and_then(|i| traj.view(i))
        .ok_or_else(|| {
            CampathError::malformed(format!(
                "frame {} is outside the trajectory (0..{})",
                index.0,
                traj.len()
            ))
        })?;
    let crop = opts.crop_context()?;
    let outputs = FrameRenderer::new(renderer).render(&view, crop.as_ref())?;
    let composited = composite_frame(&outputs, &opts.channels, &opts.colormap)?;
    if opts.missing_channel == MissingChannelPolicy::Fail
        && let Some(name) = composited.missing.first()
    {
        return Err(CampathError::channel_not_found(
            name.clone(),
            composited.available.clone(),
        ));
    }
    Ok(composited)
}

#[cfg(test)]
#[path = "../../tests/unit/session/driver.rs"]
mod tests;
