use super::*;
use crate::camera::model::{CameraModel, Intrinsics, Pose};
use crate::render::crop::CropSpec;

fn view_towards(target: DVec3, model: CameraModel) -> CameraView {
    CameraView {
        pose: Pose::look_at(DVec3::new(0.0, 0.5, 4.0), target, DVec3::Y),
        intrinsics: Intrinsics::centered(16, 12, 20.0, 20.0),
        model,
        time: None,
    }
}

#[test]
fn produces_three_channels_with_view_geometry() {
    let mut scene = AnalyticScene::default();
    let out = scene
        .render_view(&view_towards(DVec3::new(0.0, 0.5, 0.0), CameraModel::Perspective), None)
        .unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out["rgb"].channels(), 3);
    assert_eq!(out["depth"].channels(), 1);
    for img in out.values() {
        assert_eq!((img.width(), img.height()), (16, 12));
    }
}

#[test]
fn center_pixel_hits_the_front_sphere() {
    let mut scene = AnalyticScene::default();
    let out = scene
        .render_view(&view_towards(DVec3::new(0.0, 0.5, 0.0), CameraModel::Perspective), None)
        .unwrap();
    assert_eq!(out["accumulation"].pixel(8, 6), &[1.0]);
    let depth = out["depth"].pixel(8, 6)[0];
    assert!((depth - 3.5).abs() < 0.05, "depth {depth}");
}

#[test]
fn looking_at_the_sky_misses() {
    let mut scene = AnalyticScene::default();
    let out = scene
        .render_view(&view_towards(DVec3::new(0.0, 50.0, 4.0), CameraModel::Perspective), None)
        .unwrap();
    assert_eq!(out["accumulation"].pixel(8, 6), &[0.0]);
    assert_eq!(out["rgb"].pixel(8, 6), &scene.sky);
}

#[test]
fn crop_box_outside_content_yields_background_override() {
    let mut scene = AnalyticScene::default();
    let crop = CropContext::from_spec(&CropSpec {
        center: DVec3::new(10.0, 10.0, 10.0),
        scale: DVec3::splat(1.0),
        background: [1.0, 0.0, 1.0],
    })
    .unwrap();
    let out = scene
        .render_view(
            &view_towards(DVec3::new(0.0, 0.5, 0.0), CameraModel::Perspective),
            Some(&crop),
        )
        .unwrap();
    assert!(out["accumulation"].data().iter().all(|&a| a == 0.0));
    assert_eq!(out["rgb"].pixel(3, 3), &[1.0, 0.0, 1.0]);
}

#[test]
fn equirect_sees_ground_below() {
    let mut scene = AnalyticScene::default();
    let view = CameraView {
        pose: Pose::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 5.0],
        ]),
        intrinsics: Intrinsics::centered(32, 16, 16.0, 16.0),
        model: CameraModel::Equirectangular,
        time: None,
    };
    let out = scene.render_view(&view, None).unwrap();
    assert_eq!(out["accumulation"].pixel(3, 15), &[1.0]);
    assert_eq!(out["accumulation"].pixel(3, 0), &[0.0]);
}
