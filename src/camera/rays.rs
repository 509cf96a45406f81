use std::f64::consts::PI;

use glam::DVec3;

use crate::camera::model::{CameraModel, CameraView};

/// Interpupillary distance used for omnidirectional stereo eyes, in scene units.
pub const ODS_IPD: f64 = 0.064;

/// World-space ray with a unit-length direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: DVec3,
    /// Unit direction.
    pub direction: DVec3,
}

impl Ray {
    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}

/// Ray through the center of pixel `(x, y)`.
///
/// Returns `None` for pixels outside the valid image circle of a fisheye projection.
pub fn pixel_ray(view: &CameraView, x: u32, y: u32) -> Option<Ray> {
    let k = &view.intrinsics;
    let px = f64::from(x) + 0.5;
    let py = f64::from(y) + 0.5;

    let (local_origin, local_dir) = match view.model {
        CameraModel::Perspective => (
            DVec3::ZERO,
            DVec3::new((px - k.cx) / k.fx, -(py - k.cy) / k.fy, -1.0),
        ),
        CameraModel::Fisheye => {
            let u = (px - k.cx) / k.fx;
            let v = (py - k.cy) / k.fy;
            let theta = (u * u + v * v).sqrt();
            if theta > PI {
                return None;
            }
            if theta < 1e-12 {
                (DVec3::ZERO, DVec3::NEG_Z)
            } else {
                let s = theta.sin() / theta;
                (DVec3::ZERO, DVec3::new(u * s, -v * s, -theta.cos()))
            }
        }
        CameraModel::Equirectangular
        | CameraModel::OmniStereoLeft
        | CameraModel::OmniStereoRight => {
            let (lon, lat_polar) = spherical_angles(px, py, k.width, k.height);
            let dir = DVec3::new(
                lat_polar.sin() * lon.sin(),
                lat_polar.cos(),
                -lat_polar.sin() * lon.cos(),
            );
            let eye = match view.model {
                CameraModel::OmniStereoLeft => -0.5 * ODS_IPD,
                CameraModel::OmniStereoRight => 0.5 * ODS_IPD,
                _ => 0.0,
            };
            // Eye offset is tangent to the viewing circle, perpendicular to the ray in the
            // horizontal plane.
            let origin = DVec3::new(lon.cos(), 0.0, lon.sin()) * eye;
            (origin, dir)
        }
    };

    Some(Ray {
        origin: view.pose.transform_point(local_origin),
        direction: view.pose.transform_vector(local_dir).normalize(),
    })
}

/// Longitude in `[-pi, pi)` and polar angle in `[0, pi]` for a pixel center.
fn spherical_angles(px: f64, py: f64, width: u32, height: u32) -> (f64, f64) {
    let lon = px / f64::from(width) * 2.0 * PI - PI;
    let polar = py / f64::from(height) * PI;
    (lon, polar)
}

#[cfg(test)]
#[path = "../../tests/unit/camera/rays.rs"]
mod tests;
