use crate::camera::model::{CameraModel, CameraView, Intrinsics, Pose};
use crate::foundation::error::{CampathError, CampathResult};
use crate::trajectory::path_def::CameraPathDef;

/// Focal length used when [`FocalPolicy::Fixed`] is left at its default.
pub const DEFAULT_FOCAL_PX: f64 = 500.0;

/// How perspective and fisheye focal lengths are chosen.
///
/// Spherical models ignore this: they always use `fx = width / 2`, `fy = height`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocalPolicy {
    /// One focal length for every frame, independent of keyframe field of view.
    Fixed(f64),
    /// Per-frame focal from each keyframe's vertical `fov` (degrees).
    PerFrameFov {
        /// Field of view for keyframes that carry none.
        fallback_fov_deg: f64,
    },
}

impl Default for FocalPolicy {
    fn default() -> Self {
        Self::Fixed(DEFAULT_FOCAL_PX)
    }
}

/// Options for [`build_trajectory`].
#[derive(Clone, Debug)]
pub struct TrajectoryOpts {
    /// Focal length policy.
    pub focal: FocalPolicy,
    /// Uniform scale applied to output resolution and intrinsics.
    pub resolution_scale: f64,
}

impl Default for TrajectoryOpts {
    fn default() -> Self {
        Self {
            focal: FocalPolicy::default(),
            resolution_scale: 1.0,
        }
    }
}

/// Intrinsics for a trajectory: one shared value or one per frame.
#[derive(Clone, Debug, PartialEq)]
pub enum IntrinsicsTable {
    /// Same intrinsics for every frame.
    Shared(Intrinsics),
    /// One entry per frame, in trajectory order.
    PerFrame(Vec<Intrinsics>),
}

/// Ordered camera poses sharing a projection model.
#[derive(Clone, Debug)]
pub struct Trajectory {
    poses: Vec<Pose>,
    intrinsics: IntrinsicsTable,
    model: CameraModel,
    timestamps: Option<Vec<f32>>,
}

impl Trajectory {
    /// Assemble a trajectory, checking that per-frame tables match the pose count.
    pub fn new(
        poses: Vec<Pose>,
        intrinsics: IntrinsicsTable,
        model: CameraModel,
        timestamps: Option<Vec<f32>>,
    ) -> CampathResult<Self> {
        if poses.is_empty() {
            return Err(CampathError::malformed("trajectory has no poses"));
        }
        if let IntrinsicsTable::PerFrame(k) = &intrinsics
            && k.len() != poses.len()
        {
            return Err(CampathError::malformed(format!(
                "per-frame intrinsics count {} does not match pose count {}",
                k.len(),
                poses.len()
            )));
        }
        if let Some(ts) = &timestamps
            && ts.len() != poses.len()
        {
            return Err(CampathError::malformed(format!(
                "timestamp count {} does not match pose count {}",
                ts.len(),
                poses.len()
            )));
        }
        Ok(Self {
            poses,
            intrinsics,
            model,
            timestamps,
        })
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Return `true` when there are no poses.
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Poses in trajectory order.
    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    /// Projection model shared by all frames.
    pub fn model(&self) -> CameraModel {
        self.model
    }

    /// Intrinsics table.
    pub fn intrinsics(&self) -> &IntrinsicsTable {
        &self.intrinsics
    }

    /// Per-frame render times, present for all frames or for none.
    pub fn timestamps(&self) -> Option<&[f32]> {
        self.timestamps.as_deref()
    }

    /// Intrinsics for frame `i`.
    pub fn intrinsics_at(&self, i: usize) -> Option<Intrinsics> {
        match &self.intrinsics {
            IntrinsicsTable::Shared(k) => (i < self.poses.len()).then_some(*k),
            IntrinsicsTable::PerFrame(ks) => ks.get(i).copied(),
        }
    }

    /// Full camera view for frame `i`.
    pub fn view(&self, i: usize) -> Option<CameraView> {
        Some(CameraView {
            pose: *self.poses.get(i)?,
            intrinsics: self.intrinsics_at(i)?,
            model: self.model,
            time: self.timestamps.as_ref().map(|ts| ts[i]),
        })
    }

    /// Views in trajectory order.
    pub fn views(&self) -> impl Iterator<Item = CameraView> + '_ {
        (0..self.poses.len()).filter_map(|i| self.view(i))
    }
}

/// Turn a parsed camera path into a [`Trajectory`].
///
/// Keyframe order defines frame order. Timestamps are attached only when every keyframe has a
/// `render_time`. Nothing is returned on failure.
pub fn build_trajectory(def: &CameraPathDef, opts: &TrajectoryOpts) -> CampathResult<Trajectory> {
    let (width, height) = (def.render_width, def.render_height);
    if width == 0 || height == 0 {
        return Err(CampathError::malformed(format!(
            "render_width/render_height must be non-zero, got {width}x{height}"
        )));
    }
    if def.camera_path.is_empty() {
        return Err(CampathError::malformed("camera_path has no keyframes"));
    }
    let scale = opts.resolution_scale;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(CampathError::malformed(format!(
            "resolution scale must be positive, got {scale}"
        )));
    }

    let model = CameraModel::from_tag(def.camera_type.as_deref());

    let poses = def
        .camera_path
        .iter()
        .enumerate()
        .map(|(i, kf)| {
            Pose::from_row_major(&kf.camera_to_world)
                .map_err(|e| CampathError::malformed(format!("keyframe {i}: {e}")))
        })
        .collect::<CampathResult<Vec<_>>>()?;

    let intrinsics = if model.is_spherical() {
        IntrinsicsTable::Shared(Intrinsics::centered(
            width,
            height,
            f64::from(width) / 2.0,
            f64::from(height),
        ))
    } else {
        match opts.focal {
            FocalPolicy::Fixed(f) => {
                if !f.is_finite() || f <= 0.0 {
                    return Err(CampathError::malformed(format!(
                        "focal length must be positive, got {f}"
                    )));
                }
                IntrinsicsTable::Shared(Intrinsics::centered(width, height, f, f))
            }
            FocalPolicy::PerFrameFov { fallback_fov_deg } => IntrinsicsTable::PerFrame(
                def.camera_path
                    .iter()
                    .enumerate()
                    .map(|(i, kf)| {
                        let fov = kf.fov.unwrap_or(fallback_fov_deg);
                        let f = focal_from_vertical_fov(fov, height).map_err(|e| {
                            CampathError::malformed(format!("keyframe {i}: {e}"))
                        })?;
                        Ok(Intrinsics::centered(width, height, f, f))
                    })
                    .collect::<CampathResult<Vec<_>>>()?,
            ),
        }
    };

    let intrinsics = if scale == 1.0 {
        intrinsics
    } else {
        match intrinsics {
            IntrinsicsTable::Shared(k) => IntrinsicsTable::Shared(k.scaled(scale)),
            IntrinsicsTable::PerFrame(ks) => {
                IntrinsicsTable::PerFrame(ks.into_iter().map(|k| k.scaled(scale)).collect())
            }
        }
    };

    let timestamps = def
        .camera_path
        .iter()
        .map(|kf| kf.render_time.map(|t| t as f32))
        .collect::<Option<Vec<_>>>();
    if timestamps.is_none() && def.camera_path.iter().any(|kf| kf.render_time.is_some()) {
        tracing::debug!("render_time missing on some keyframes; dropping all timestamps");
    }

    Trajectory::new(poses, intrinsics, model, timestamps)
}

/// Focal length (pixels) for a vertical field of view, three.js perspective-camera convention.
pub fn focal_from_vertical_fov(fov_deg: f64, height: u32) -> CampathResult<f64> {
    if !fov_deg.is_finite() || fov_deg <= 0.0 || fov_deg >= 180.0 {
        return Err(CampathError::malformed(format!(
            "fov must be in (0, 180) degrees, got {fov_deg}"
        )));
    }
    Ok(0.5 * f64::from(height) / (fov_deg.to_radians() / 2.0).tan())
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/builder.rs"]
mod tests;
