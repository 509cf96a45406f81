use std::f64::consts::TAU;

use glam::DVec3;

use crate::camera::model::{CameraModel, Intrinsics, Pose};
use crate::foundation::error::{CampathError, CampathResult};
use crate::trajectory::builder::{IntrinsicsTable, Trajectory};

/// Options for [`spiral_trajectory`].
#[derive(Clone, Debug)]
pub struct SpiralOpts {
    /// Number of frames on the spiral.
    pub steps: usize,
    /// Orbit radius in scene units.
    pub radius: f64,
    /// Full revolutions over the path.
    pub rotations: f64,
    /// Depth oscillation rate relative to the revolution rate.
    pub zrate: f64,
    /// Distance in front of the base camera that every frame looks at.
    pub focus_distance: f64,
}

impl Default for SpiralOpts {
    fn default() -> Self {
        Self {
            steps: 30,
            radius: 0.1,
            rotations: 2.0,
            zrate: 0.5,
            focus_distance: 1.0,
        }
    }
}

/// Spiral orbit around `base`, every frame looking at a point `focus_distance` in front of it.
///
/// The path is open at the end (the last frame is one step short of the first), so looping the
/// output video is seamless.
pub fn spiral_trajectory(
    base: Pose,
    intrinsics: Intrinsics,
    model: CameraModel,
    opts: &SpiralOpts,
) -> CampathResult<Trajectory> {
    if opts.steps == 0 {
        return Err(CampathError::malformed("spiral needs at least one step"));
    }
    if !opts.radius.is_finite() || !opts.focus_distance.is_finite() || opts.focus_distance <= 0.0
    {
        return Err(CampathError::malformed(
            "spiral radius and focus distance must be finite, focus distance positive",
        ));
    }

    let focus = base.transform_point(DVec3::new(0.0, 0.0, -opts.focus_distance));
    let up = base.transform_vector(DVec3::Y);

    let poses = (0..opts.steps)
        .map(|i| {
            let theta = TAU * opts.rotations * i as f64 / opts.steps as f64;
            let offset = DVec3::new(
                theta.cos(),
                -theta.sin(),
                -(theta * opts.zrate).sin(),
            ) * opts.radius;
            Pose::look_at(base.transform_point(offset), focus, up)
        })
        .collect();

    Trajectory::new(poses, IntrinsicsTable::Shared(intrinsics), model, None)
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/spiral.rs"]
mod tests;
