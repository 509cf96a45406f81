use glam::DVec3;

use crate::camera::rays::Ray;
use crate::foundation::error::{CampathError, CampathResult};

/// Trajectory-wide crop region with a background override.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropSpec {
    /// Box center in world space.
    pub center: DVec3,
    /// Full box extent per axis.
    pub scale: DVec3,
    /// Linear RGB in `[0, 1]` used wherever the box leaves the view empty.
    pub background: [f32; 3],
}

impl CropSpec {
    /// Axis-aligned box `center ± scale / 2`.
    pub fn aabb(&self) -> Aabb {
        let half = self.scale * 0.5;
        Aabb {
            min: self.center - half,
            max: self.center + half,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: DVec3,
    /// Maximum corner.
    pub max: DVec3,
}

impl Aabb {
    /// `true` when `p` lies inside or on the boundary.
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Parametric interval `[t_near, t_far]` where `ray` is inside the box (slab test).
    pub fn ray_interval(&self, ray: &Ray) -> Option<(f64, f64)> {
        let inv = ray.direction.recip();
        let t0 = (self.min - ray.origin) * inv;
        let t1 = (self.max - ray.origin) * inv;
        let near = t0.min(t1).max_element().max(0.0);
        let far = t0.max(t1).min_element();
        (near <= far).then_some((near, far))
    }
}

/// Per-run crop state handed to the scene renderer with every view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropContext {
    /// Region the renderer restricts itself to.
    pub aabb: Aabb,
    /// Background color override.
    pub background: [f32; 3],
}

impl CropContext {
    /// Validate a [`CropSpec`] and derive its box.
    pub fn from_spec(spec: &CropSpec) -> CampathResult<Self> {
        if !spec.center.is_finite() || !spec.scale.is_finite() {
            return Err(CampathError::malformed("crop center/scale must be finite"));
        }
        if spec.scale.min_element() < 0.0 {
            return Err(CampathError::malformed("crop scale must be non-negative"));
        }
        if spec.background.iter().any(|c| !c.is_finite()) {
            return Err(CampathError::malformed("crop background must be finite"));
        }
        Ok(Self {
            aabb: spec.aabb(),
            background: spec.background,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/crop.rs"]
mod tests;
