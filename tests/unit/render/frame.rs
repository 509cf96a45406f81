use super::*;
use crate::camera::model::{Intrinsics, Pose};
use crate::render::outputs::ChannelImage;

fn view(model: CameraModel) -> CameraView {
    CameraView {
        pose: Pose::IDENTITY,
        intrinsics: Intrinsics::centered(4, 2, 2.0, 2.0),
        model,
        time: None,
    }
}

fn eye_marker(view: &CameraView, _crop: Option<&CropContext>) -> CampathResult<RenderOutputs> {
    let k = view.intrinsics;
    let v = match view.model {
        CameraModel::OmniStereoRight => 1.0,
        _ => 0.0,
    };
    let mut out = RenderOutputs::new();
    out.insert("rgb".into(), ChannelImage::filled(k.width, k.height, &[v, v, v])?);
    if view.model != CameraModel::OmniStereoRight {
        out.insert("left_only".into(), ChannelImage::filled(k.width, k.height, &[v])?);
    }
    Ok(out)
}

#[test]
fn mono_views_pass_through() {
    let mut r = eye_marker;
    let mut fr = FrameRenderer::new(&mut r);
    let out = fr.render(&view(CameraModel::Perspective), None).unwrap();
    assert_eq!(out["rgb"].height(), 2);
    assert!(out.contains_key("left_only"));
}

#[test]
fn omni_stereo_stacks_left_over_right() {
    let mut r = eye_marker;
    let mut fr = FrameRenderer::new(&mut r);
    let out = fr.render(&view(CameraModel::OmniStereoLeft), None).unwrap();
    let rgb = &out["rgb"];
    assert_eq!((rgb.width(), rgb.height()), (4, 4));
    assert_eq!(rgb.pixel(0, 0), &[0.0, 0.0, 0.0]);
    assert_eq!(rgb.pixel(0, 3), &[1.0, 1.0, 1.0]);
    assert!(!out.contains_key("left_only"));
}

#[test]
fn renderer_errors_propagate() {
    let mut r = |_: &CameraView, _: Option<&CropContext>| -> CampathResult<RenderOutputs> {
        Err(CampathError::render("device lost"))
    };
    let mut fr = FrameRenderer::new(&mut r);
    assert!(matches!(
        fr.render(&view(CameraModel::Perspective), None),
        Err(CampathError::Render(_))
    ));
}
