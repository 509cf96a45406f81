use super::*;

fn spec() -> CropSpec {
    CropSpec {
        center: DVec3::new(1.0, 0.0, 0.0),
        scale: DVec3::new(2.0, 4.0, 6.0),
        background: [0.0, 0.5, 1.0],
    }
}

#[test]
fn aabb_is_center_plus_minus_half_scale() {
    let b = spec().aabb();
    assert_eq!(b.min, DVec3::new(0.0, -2.0, -3.0));
    assert_eq!(b.max, DVec3::new(2.0, 2.0, 3.0));
    assert!(b.contains(DVec3::new(1.0, 0.0, 0.0)));
    assert!(b.contains(b.max));
    assert!(!b.contains(DVec3::new(2.5, 0.0, 0.0)));
}

#[test]
fn ray_interval_hits_and_misses() {
    let b = spec().aabb();
    let hit = Ray {
        origin: DVec3::new(-5.0, 0.0, 0.0),
        direction: DVec3::X,
    };
    let (near, far) = b.ray_interval(&hit).unwrap();
    assert!((near - 5.0).abs() < 1e-12);
    assert!((far - 7.0).abs() < 1e-12);

    let miss = Ray {
        origin: DVec3::new(-5.0, 10.0, 0.0),
        direction: DVec3::X,
    };
    assert!(b.ray_interval(&miss).is_none());
}

#[test]
fn context_rejects_negative_scale() {
    let mut s = spec();
    s.scale.y = -1.0;
    assert!(CropContext::from_spec(&s).is_err());
    let ctx = CropContext::from_spec(&spec()).unwrap();
    assert_eq!(ctx.background, [0.0, 0.5, 1.0]);
}
