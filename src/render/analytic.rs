use std::f64::consts::TAU;

use glam::DVec3;
use rayon::prelude::*;

use crate::camera::model::CameraView;
use crate::camera::rays::{Ray, pixel_ray};
use crate::foundation::error::CampathResult;
use crate::render::backend::SceneRenderer;
use crate::render::crop::CropContext;
use crate::render::outputs::{ChannelImage, RenderOutputs};

/// Sphere primitive of an [`AnalyticScene`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Center at time 0.
    pub center: DVec3,
    /// Radius.
    pub radius: f64,
    /// Linear RGB albedo.
    pub albedo: [f32; 3],
    /// Vertical bob amplitude over one unit of render time.
    pub bob: f64,
}

/// Closed-form reference scene: spheres over a checkered ground plane.
///
/// Produces `rgb`, `depth` and `accumulation` channels, honors every camera model and the crop
/// box. Useful for previewing camera paths without a trained model.
#[derive(Clone, Debug)]
pub struct AnalyticScene {
    /// Spheres in the scene.
    pub spheres: Vec<Sphere>,
    /// Height of the ground plane (`y = ground_y`).
    pub ground_y: f64,
    /// Sky color for rays that hit nothing.
    pub sky: [f32; 3],
    /// Depth reported for rays that hit nothing.
    pub far: f32,
}

impl Default for AnalyticScene {
    fn default() -> Self {
        Self {
            spheres: vec![
                Sphere {
                    center: DVec3::new(0.0, 0.5, 0.0),
                    radius: 0.5,
                    albedo: [0.85, 0.25, 0.2],
                    bob: 0.0,
                },
                Sphere {
                    center: DVec3::new(1.2, 0.35, -0.6),
                    radius: 0.35,
                    albedo: [0.2, 0.6, 0.9],
                    bob: 0.25,
                },
                Sphere {
                    center: DVec3::new(-1.1, 0.3, 0.5),
                    radius: 0.3,
                    albedo: [0.3, 0.8, 0.35],
                    bob: 0.15,
                },
            ],
            ground_y: 0.0,
            sky: [0.55, 0.7, 0.9],
            far: 100.0,
        }
    }
}

const LIGHT_DIR: DVec3 = DVec3::new(0.4, 0.8, 0.45);
const AMBIENT: f64 = 0.25;
const GROUND_TILE: f64 = 0.5;

#[derive(Clone, Copy)]
struct Sample {
    rgb: [f32; 3],
    depth: f32,
    acc: f32,
}

impl AnalyticScene {
    fn spheres_at(&self, time: Option<f32>) -> Vec<Sphere> {
        let t = f64::from(time.unwrap_or(0.0));
        self.spheres
            .iter()
            .map(|s| Sphere {
                center: s.center + DVec3::Y * s.bob * (TAU * t).sin(),
                ..*s
            })
            .collect()
    }

    fn trace(&self, spheres: &[Sphere], ray: &Ray, crop: Option<&CropContext>) -> Option<Sample> {
        let (t_min, t_max) = match crop {
            Some(c) => c.aabb.ray_interval(ray)?,
            None => (0.0, f64::from(self.far)),
        };

        let mut best: Option<(f64, DVec3, [f32; 3])> = None;
        for s in spheres {
            if let Some(t) = intersect_sphere(ray, s, t_min, t_max)
                && best.is_none_or(|(bt, _, _)| t < bt)
            {
                let n = (ray.at(t) - s.center) / s.radius;
                best = Some((t, n, s.albedo));
            }
        }
        if ray.direction.y.abs() > 1e-12 {
            let t = (self.ground_y - ray.origin.y) / ray.direction.y;
            if t > t_min.max(1e-6) && t <= t_max && best.is_none_or(|(bt, _, _)| t < bt) {
                let p = ray.at(t);
                let checker = ((p.x / GROUND_TILE).floor() + (p.z / GROUND_TILE).floor()) as i64;
                let albedo = if checker.rem_euclid(2) == 0 {
                    [0.8, 0.8, 0.78]
                } else {
                    [0.35, 0.35, 0.38]
                };
                best = Some((t, DVec3::Y, albedo));
            }
        }

        let (t, normal, albedo) = best?;
        let light = LIGHT_DIR.normalize();
        let shade = (AMBIENT + (1.0 - AMBIENT) * normal.dot(light).max(0.0)) as f32;
        Some(Sample {
            rgb: albedo.map(|c| c * shade),
            depth: t as f32,
            acc: 1.0,
        })
    }
}

fn intersect_sphere(ray: &Ray, s: &Sphere, t_min: f64, t_max: f64) -> Option<f64> {
    let oc = ray.origin - s.center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - s.radius * s.radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    [-b - sq, -b + sq]
        .into_iter()
        .find(|&t| t > t_min.max(1e-6) && t <= t_max)
}

impl SceneRenderer for AnalyticScene {
    fn render_view(
        &mut self,
        view: &CameraView,
        crop: Option<&CropContext>,
    ) -> CampathResult<RenderOutputs> {
        let (w, h) = (view.intrinsics.width, view.intrinsics.height);
        let spheres = self.spheres_at(view.time);
        let background = crop.map_or(self.sky, |c| c.background);
        let miss = Sample {
            rgb: background,
            depth: self.far,
            acc: 0.0,
        };

        let samples: Vec<Sample> = (0..w as usize * h as usize)
            .into_par_iter()
            .map(|i| {
                let (x, y) = ((i % w as usize) as u32, (i / w as usize) as u32);
                pixel_ray(view, x, y)
                    .and_then(|ray| self.trace(&spheres, &ray, crop))
                    .unwrap_or(miss)
            })
            .collect();

        let rgb = samples.iter().flat_map(|s| s.rgb).collect();
        let depth = samples.iter().map(|s| s.depth).collect();
        let acc = samples.iter().map(|s| s.acc).collect();

        let mut out = RenderOutputs::new();
        out.insert("rgb".to_owned(), ChannelImage::new(w, h, 3, rgb)?);
        out.insert("depth".to_owned(), ChannelImage::new(w, h, 1, depth)?);
        out.insert("accumulation".to_owned(), ChannelImage::new(w, h, 1, acc)?);
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/analytic.rs"]
mod tests;
