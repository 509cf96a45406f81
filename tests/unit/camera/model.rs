use super::*;
use approx::assert_relative_eq;

#[test]
fn camera_model_resolution_is_total() {
    assert_eq!(CameraModel::from_tag(None), CameraModel::Perspective);
    assert_eq!(
        CameraModel::from_tag(Some("perspective")),
        CameraModel::Perspective
    );
    assert_eq!(CameraModel::from_tag(Some("fisheye")), CameraModel::Fisheye);
    assert_eq!(
        CameraModel::from_tag(Some("equirectangular")),
        CameraModel::Equirectangular
    );
    assert_eq!(
        CameraModel::from_tag(Some("OmniDirectional")),
        CameraModel::OmniStereoLeft
    );
    assert_eq!(
        CameraModel::from_tag(Some("omnidirectional")),
        CameraModel::OmniStereoLeft
    );
    // Fisheye and equirectangular are exact matches.
    assert_eq!(CameraModel::from_tag(Some("Fisheye")), CameraModel::Perspective);
    assert_eq!(
        CameraModel::from_tag(Some("EQUIRECTANGULAR")),
        CameraModel::Perspective
    );
    assert_eq!(
        CameraModel::from_tag(Some("omnidirectional_stereo")),
        CameraModel::Perspective
    );
    assert_eq!(CameraModel::from_tag(Some("")), CameraModel::Perspective);
}

#[test]
fn pose_from_row_major_keeps_top_three_rows() {
    let m = [
        1.0, 0.0, 0.0, 5.0, //
        0.0, 0.0, -1.0, 6.0, //
        0.0, 1.0, 0.0, 7.0, //
        9.0, 9.0, 9.0, 9.0,
    ];
    let pose = Pose::from_row_major(&m).unwrap();
    assert_eq!(
        pose.rows(),
        [
            [1.0, 0.0, 0.0, 5.0],
            [0.0, 0.0, -1.0, 6.0],
            [0.0, 1.0, 0.0, 7.0]
        ]
    );
    assert_eq!(pose.translation(), DVec3::new(5.0, 6.0, 7.0));
    let p = pose.transform_point(DVec3::new(0.0, 0.0, -1.0));
    assert_relative_eq!(p.x, 5.0);
    assert_relative_eq!(p.y, 7.0);
    assert_relative_eq!(p.z, 7.0);
}

#[test]
fn pose_rejects_wrong_length_and_non_finite() {
    assert!(matches!(
        Pose::from_row_major(&[0.0; 12]),
        Err(CampathError::MalformedInput(_))
    ));
    let mut m = [0.0; 16];
    m[3] = f64::INFINITY;
    assert!(Pose::from_row_major(&m).is_err());
}

#[test]
fn look_at_points_minus_z_at_target() {
    let eye = DVec3::new(0.0, 0.0, 5.0);
    let pose = Pose::look_at(eye, DVec3::ZERO, DVec3::Y);
    let forward = pose.transform_vector(DVec3::new(0.0, 0.0, -1.0));
    assert_relative_eq!(forward.z, -1.0, epsilon = 1e-12);
    let up = pose.transform_vector(DVec3::Y);
    assert_relative_eq!(up.y, 1.0, epsilon = 1e-12);
}

#[test]
fn intrinsics_scale_keeps_center() {
    let k = Intrinsics::centered(640, 480, 500.0, 500.0).scaled(0.5);
    assert_eq!((k.width, k.height), (320, 240));
    assert_relative_eq!(k.fx, 250.0);
    assert_relative_eq!(k.cx, 160.0);
    assert_relative_eq!(k.cy, 120.0);
}
