//! campath renders camera-path trajectories through a scene model and streams the composited
//! frames to an MP4 file or a numbered image sequence.
//!
//! The pipeline is strictly one-directional:
//!
//! - Parse a [`CameraPathDef`] and build a [`Trajectory`] of poses and intrinsics
//! - Render each [`CameraView`] through a [`SceneRenderer`]
//! - Composite the requested channels into one RGB8 [`CompositeFrame`]
//! - Push frames into a [`FrameSink`], which is finished exactly once per run
//!
//! [`TrajectoryDriver`] runs that loop sequentially and reports through a [`ProgressObserver`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod camera;
pub(crate) mod composite;
/// Output sinks: MP4 through `ffmpeg`, image sequences, in-memory capture.
pub mod encode;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod trajectory;

pub use crate::foundation::core::{FrameIndex, FrameRate};
pub use crate::foundation::error::{CampathError, CampathResult};

pub use crate::camera::model::{CameraModel, CameraView, Intrinsics, Pose};
pub use crate::camera::rays::{ODS_IPD, Ray, pixel_ray};
pub use crate::composite::colormap::{Colormap, ColormapOptions, apply_colormap};
pub use crate::composite::compositor::{CompositeFrame, Composited, composite_frame};
pub use crate::encode::ffmpeg::{VideoSink, VideoSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::images::{ImageEncoding, ImageSequenceSink};
pub use crate::encode::sink::{
    FrameSink, InMemorySink, SinkConfig, SinkKind, SinkReport, create_sink,
};
pub use crate::render::analytic::{AnalyticScene, Sphere};
pub use crate::render::backend::SceneRenderer;
pub use crate::render::crop::{Aabb, CropContext, CropSpec};
pub use crate::render::frame::FrameRenderer;
pub use crate::render::outputs::{ChannelImage, RenderOutputs};
pub use crate::session::driver::{
    DriverOpts, DriverState, MissingChannelPolicy, TrajectoryDriver, render_single_frame,
    render_trajectory,
};
pub use crate::session::observer::{
    NullObserver, ProgressEvent, ProgressObserver, RecordingObserver, RenderSummary,
    TracingObserver,
};
pub use crate::trajectory::builder::{
    DEFAULT_FOCAL_PX, FocalPolicy, IntrinsicsTable, Trajectory, TrajectoryOpts, build_trajectory,
    focal_from_vertical_fov,
};
pub use crate::trajectory::path_def::{CameraPathDef, ColorDef, CropDef, KeyframeDef};
pub use crate::trajectory::spiral::{SpiralOpts, spiral_trajectory};
