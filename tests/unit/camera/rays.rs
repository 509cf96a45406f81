use super::*;
use crate::camera::model::{Intrinsics, Pose};
use approx::assert_relative_eq;

fn view(model: CameraModel, width: u32, height: u32, focal: f64) -> CameraView {
    CameraView {
        pose: Pose::IDENTITY,
        intrinsics: Intrinsics::centered(width, height, focal, focal),
        model,
        time: None,
    }
}

#[test]
fn perspective_center_ray_looks_down_minus_z() {
    // Even grid: pixel (1, 1) of a 3x3 image is exactly centered.
    let v = view(CameraModel::Perspective, 3, 3, 10.0);
    let r = pixel_ray(&v, 1, 1).unwrap();
    assert_relative_eq!(r.direction.z, -1.0, epsilon = 1e-12);
    assert_eq!(r.origin, DVec3::ZERO);
}

#[test]
fn perspective_top_row_points_up() {
    let v = view(CameraModel::Perspective, 4, 4, 2.0);
    let r = pixel_ray(&v, 2, 0).unwrap();
    assert!(r.direction.y > 0.0);
}

#[test]
fn fisheye_rejects_pixels_past_pi() {
    let v = view(CameraModel::Fisheye, 100, 100, 1.0);
    assert!(pixel_ray(&v, 0, 0).is_none());
    let v = view(CameraModel::Fisheye, 100, 100, 100.0);
    assert!(pixel_ray(&v, 0, 0).is_some());
}

#[test]
fn equirect_center_is_forward_and_top_is_up() {
    let v = view(CameraModel::Equirectangular, 360, 180, 0.0);
    let center = pixel_ray(&v, 180, 90).unwrap();
    assert!(center.direction.z < -0.99);
    let top = pixel_ray(&v, 180, 0).unwrap();
    assert!(top.direction.y > 0.99);
}

#[test]
fn omni_stereo_eyes_are_separated_by_ipd() {
    let l = pixel_ray(&view(CameraModel::OmniStereoLeft, 360, 180, 0.0), 180, 90).unwrap();
    let r = pixel_ray(&view(CameraModel::OmniStereoRight, 360, 180, 0.0), 180, 90).unwrap();
    assert_relative_eq!(l.origin.distance(r.origin), ODS_IPD, epsilon = 1e-9);
    assert_relative_eq!(l.direction.dot(r.direction), 1.0, epsilon = 1e-12);
}
