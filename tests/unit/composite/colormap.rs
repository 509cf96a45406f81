use super::*;
use approx::assert_relative_eq;

fn scalar(values: &[f32]) -> ChannelImage {
    ChannelImage::new(values.len() as u32, 1, 1, values.to_vec()).unwrap()
}

#[test]
fn rgb_default_passes_through_clamped() {
    let img = ChannelImage::new(2, 1, 3, vec![0.1, 0.5, 0.9, -1.0, 2.0, f32::NAN]).unwrap();
    let out = apply_colormap(&img, &ColormapOptions::default()).unwrap();
    assert_eq!(out, vec![0.1, 0.5, 0.9, 0.0, 1.0, 0.0]);
}

#[test]
fn gray_with_explicit_range() {
    let opts = ColormapOptions {
        colormap: Colormap::Gray,
        range: Some((2.0, 4.0)),
        ..Default::default()
    };
    let out = apply_colormap(&scalar(&[2.0, 3.0, 10.0]), &opts).unwrap();
    assert_eq!(out, vec![0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0]);
}

#[test]
fn narrow_explicit_range_still_spreads_values() {
    let opts = ColormapOptions {
        colormap: Colormap::Gray,
        range: Some((0.0, 1e-8)),
        ..Default::default()
    };
    let out = apply_colormap(&scalar(&[0.0, 5e-9, 1e-8]), &opts).unwrap();
    assert_relative_eq!(out[0], 0.0);
    assert_relative_eq!(out[3], 0.5, epsilon = 1e-4);
    assert_relative_eq!(out[6], 1.0, epsilon = 1e-4);
}

#[test]
fn normalize_uses_finite_extent_and_invert_flips() {
    let opts = ColormapOptions {
        colormap: Colormap::Gray,
        normalize: true,
        invert: true,
        nan_fill: None,
        ..Default::default()
    };
    let out = apply_colormap(&scalar(&[10.0, 20.0, f32::INFINITY, 15.0]), &opts).unwrap();
    assert_relative_eq!(out[0], 1.0);
    assert_relative_eq!(out[3], 0.0);
    assert_relative_eq!(out[9], 0.5);
}

#[test]
fn nan_fill_replaces_invalid_values_before_mapping() {
    let opts = ColormapOptions {
        colormap: Colormap::Gray,
        nan_fill: Some(1.0),
        ..Default::default()
    };
    let out = apply_colormap(&scalar(&[f32::NAN]), &opts).unwrap();
    assert_eq!(out, vec![1.0, 1.0, 1.0]);

    let unfilled = ColormapOptions {
        nan_fill: None,
        ..opts
    };
    let out = apply_colormap(&scalar(&[f32::NAN]), &unfilled).unwrap();
    assert_eq!(out, vec![0.0, 0.0, 0.0]);
}

#[test]
fn single_channel_default_is_turbo() {
    let a = apply_colormap(&scalar(&[0.0, 1.0]), &ColormapOptions::default()).unwrap();
    let b = apply_colormap(
        &scalar(&[0.0, 1.0]),
        &ColormapOptions {
            colormap: Colormap::Turbo,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
    // Turbo ends in dark red, brighter in red than where it starts.
    assert!(a[3] > a[5]);
    assert!(a[3] > a[0]);
}

#[test]
fn inferno_endpoints() {
    let opts = ColormapOptions {
        colormap: Colormap::Inferno,
        ..Default::default()
    };
    let out = apply_colormap(&scalar(&[0.0, 1.0]), &opts).unwrap();
    assert!(out[..3].iter().all(|&v| v < 0.05));
    assert!(out[3] > 0.9 && out[4] > 0.9);
}

#[test]
fn invalid_range_is_rejected() {
    let opts = ColormapOptions {
        range: Some((1.0, 1.0)),
        ..Default::default()
    };
    assert!(matches!(
        apply_colormap(&scalar(&[0.5]), &opts),
        Err(CampathError::MalformedInput(_))
    ));
}
