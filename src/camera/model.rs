use glam::{DMat3, DVec3};

use crate::foundation::error::{CampathError, CampathResult};

/// Projection model used to turn pixels into rays.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CameraModel {
    /// Pinhole projection.
    #[default]
    Perspective,
    /// Equidistant fisheye projection.
    Fisheye,
    /// Full 360x180 latitude/longitude projection.
    Equirectangular,
    /// Omnidirectional stereo, left eye.
    OmniStereoLeft,
    /// Omnidirectional stereo, right eye.
    OmniStereoRight,
}

impl CameraModel {
    /// Resolve a camera-path `camera_type` tag.
    ///
    /// Total: unknown or absent tags resolve to [`CameraModel::Perspective`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("fisheye") => Self::Fisheye,
            Some("equirectangular") => Self::Equirectangular,
            Some(t) if t.eq_ignore_ascii_case("omnidirectional") => Self::OmniStereoLeft,
            _ => Self::Perspective,
        }
    }

    /// `true` for models whose output covers the full sphere.
    pub fn is_spherical(self) -> bool {
        matches!(
            self,
            Self::Equirectangular | Self::OmniStereoLeft | Self::OmniStereoRight
        )
    }

    /// `true` for either omnidirectional stereo eye.
    pub fn is_omni_stereo(self) -> bool {
        matches!(self, Self::OmniStereoLeft | Self::OmniStereoRight)
    }
}

/// Pinhole-style intrinsics for one output image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Intrinsics {
    /// Horizontal focal length in pixels.
    pub fx: f64,
    /// Vertical focal length in pixels.
    pub fy: f64,
    /// Principal point x in pixels.
    pub cx: f64,
    /// Principal point y in pixels.
    pub cy: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}

impl Intrinsics {
    /// Intrinsics with the principal point at the image center.
    pub fn centered(width: u32, height: u32, fx: f64, fy: f64) -> Self {
        Self {
            fx,
            fy,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            width,
            height,
        }
    }

    /// Scale the pixel grid and focal lengths by `factor`.
    ///
    /// Dimensions are rounded and never drop below one pixel.
    pub fn scaled(self, factor: f64) -> Self {
        let width = ((f64::from(self.width) * factor).round() as u32).max(1);
        let height = ((f64::from(self.height) * factor).round() as u32).max(1);
        Self {
            fx: self.fx * factor,
            fy: self.fy * factor,
            cx: f64::from(width) / 2.0,
            cy: f64::from(height) / 2.0,
            width,
            height,
        }
    }
}

/// Camera-to-world rigid transform (top 3 rows of a 4x4 matrix).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    rotation: DMat3,
    translation: DVec3,
}

impl Pose {
    /// Identity pose at the world origin looking down `-Z`.
    pub const IDENTITY: Self = Self {
        rotation: DMat3::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Build from a flat, row-major 4x4 matrix; the bottom row is ignored.
    pub fn from_row_major(m: &[f64]) -> CampathResult<Self> {
        if m.len() != 16 {
            return Err(CampathError::malformed(format!(
                "camera_to_world must have 16 entries, got {}",
                m.len()
            )));
        }
        if m.iter().any(|v| !v.is_finite()) {
            return Err(CampathError::malformed(
                "camera_to_world contains non-finite values",
            ));
        }
        Ok(Self::from_rows([
            [m[0], m[1], m[2], m[3]],
            [m[4], m[5], m[6], m[7]],
            [m[8], m[9], m[10], m[11]],
        ]))
    }

    /// Build from the three rows of a 3x4 camera-to-world matrix.
    pub fn from_rows(rows: [[f64; 4]; 3]) -> Self {
        let col = |c: usize| DVec3::new(rows[0][c], rows[1][c], rows[2][c]);
        Self {
            rotation: DMat3::from_cols(col(0), col(1), col(2)),
            translation: col(3),
        }
    }

    /// Build from a rotation and a camera position.
    pub fn from_rotation_translation(rotation: DMat3, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Camera at `eye` looking at `target` (camera looks down its local `-Z`, `+Y` is up).
    pub fn look_at(eye: DVec3, target: DVec3, up: DVec3) -> Self {
        let back = (eye - target).normalize_or(DVec3::Z);
        let mut right = up.cross(back);
        if right.length_squared() < 1e-12 {
            right = back.any_orthonormal_vector();
        }
        let right = right.normalize();
        let cam_up = back.cross(right);
        Self {
            rotation: DMat3::from_cols(right, cam_up, back),
            translation: eye,
        }
    }

    /// Rotation part (camera axes expressed in world space, as columns).
    pub fn rotation(&self) -> DMat3 {
        self.rotation
    }

    /// Camera center in world space.
    pub fn translation(&self) -> DVec3 {
        self.translation
    }

    /// The 3x4 matrix as rows.
    pub fn rows(&self) -> [[f64; 4]; 3] {
        let r = self.rotation;
        let t = self.translation;
        [
            [r.x_axis.x, r.y_axis.x, r.z_axis.x, t.x],
            [r.x_axis.y, r.y_axis.y, r.z_axis.y, t.y],
            [r.x_axis.z, r.y_axis.z, r.z_axis.z, t.z],
        ]
    }

    /// Map a camera-space point to world space.
    pub fn transform_point(&self, p: DVec3) -> DVec3 {
        self.rotation * p + self.translation
    }

    /// Map a camera-space direction to world space.
    pub fn transform_vector(&self, v: DVec3) -> DVec3 {
        self.rotation * v
    }
}

/// Everything a scene renderer needs to produce one view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    /// Camera-to-world transform.
    pub pose: Pose,
    /// Intrinsics, including the pixel grid size.
    pub intrinsics: Intrinsics,
    /// Projection model.
    pub model: CameraModel,
    /// Normalized render time for dynamic scenes.
    pub time: Option<f32>,
}

impl CameraView {
    /// Same view with a different projection model.
    pub fn with_model(self, model: CameraModel) -> Self {
        Self { model, ..self }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/camera/model.rs"]
mod tests;
