use rayon::prelude::*;

use crate::foundation::error::{CampathError, CampathResult};
use crate::render::outputs::ChannelImage;

/// Named mapping from a scalar in `[0, 1]` to RGB.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// RGB channels pass through; single-channel images use [`Colormap::Turbo`].
    #[default]
    Default,
    /// Grayscale ramp.
    Gray,
    /// Turbo rainbow map.
    Turbo,
    /// Inferno perceptual map.
    Inferno,
}

/// How a channel image is mapped to displayable RGB.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ColormapOptions {
    /// Colormap to apply.
    pub colormap: Colormap,
    /// Rescale single-channel values by the image's own finite min/max.
    pub normalize: bool,
    /// Explicit `(min, max)` bounds mapped to `[0, 1]`; takes precedence over `normalize`.
    pub range: Option<(f32, f32)>,
    /// Flip single-channel values (`v -> 1 - v`) after rescaling.
    pub invert: bool,
    /// Replacement for NaN and infinite values; `None` leaves them for quantization to zero.
    pub nan_fill: Option<f32>,
}

impl Default for ColormapOptions {
    fn default() -> Self {
        Self {
            colormap: Colormap::Default,
            normalize: false,
            range: None,
            invert: false,
            nan_fill: Some(0.0),
        }
    }
}

/// Map `image` to interleaved RGB floats in `[0, 1]` (`height * width * 3` values).
pub fn apply_colormap(image: &ChannelImage, opts: &ColormapOptions) -> CampathResult<Vec<f32>> {
    let fill = |v: f32| match opts.nan_fill {
        Some(f) if !v.is_finite() => f,
        _ => v,
    };

    if image.channels() == 3 && opts.colormap == Colormap::Default {
        return Ok(image.data().iter().map(|&v| clamp01(fill(v))).collect());
    }

    // Scalar path: single-channel images, or RGB reduced to its mean for an explicit colormap.
    let scalars: Vec<f32> = if image.channels() == 1 {
        image.data().iter().map(|&v| fill(v)).collect()
    } else {
        image
            .data()
            .chunks_exact(3)
            .map(|p| fill((p[0] + p[1] + p[2]) / 3.0))
            .collect()
    };

    let (lo, hi) = match opts.range {
        Some((lo, hi)) => {
            if !(lo.is_finite() && hi.is_finite() && hi > lo) {
                return Err(CampathError::malformed(format!(
                    "colormap range must satisfy min < max, got ({lo}, {hi})"
                )));
            }
            (lo, hi)
        }
        None if opts.normalize => finite_min_max(&scalars).unwrap_or((0.0, 1.0)),
        None => (0.0, 1.0),
    };
    let span = hi - lo;
    let map: fn(f32) -> [f32; 3] = match opts.colormap {
        Colormap::Gray => gray,
        Colormap::Inferno => inferno,
        Colormap::Default | Colormap::Turbo => turbo,
    };

    let mut out = vec![0.0f32; scalars.len() * 3];
    out.par_chunks_exact_mut(3)
        .zip(scalars.par_iter())
        .for_each(|(dst, &v)| {
            let mut t = if span > 0.0 { (v - lo) / span } else { 0.0 };
            t = clamp01(t);
            if opts.invert {
                t = 1.0 - t;
            }
            if v.is_nan() {
                dst.copy_from_slice(&[0.0; 3]);
            } else {
                dst.copy_from_slice(&map(t));
            }
        });
    Ok(out)
}

fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn finite_min_max(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn gray(t: f32) -> [f32; 3] {
    [t, t, t]
}

fn horner(t: f32, c: &[f32]) -> f32 {
    c.iter().rev().fold(0.0, |acc, &k| acc * t + k)
}

/// Polynomial fit of the Turbo colormap.
fn turbo(t: f32) -> [f32; 3] {
    const R: [f32; 6] = [
        0.135_721_38,
        4.615_392_6,
        -42.660_324,
        132.131_08,
        -152.942_39,
        59.286_38,
    ];
    const G: [f32; 6] = [
        0.091_402_61,
        2.194_188_4,
        4.842_966_6,
        -14.185_033,
        4.277_298_7,
        2.829_566,
    ];
    const B: [f32; 6] = [
        0.106_673_3,
        12.641_946,
        -60.582_05,
        110.362_77,
        -89.903_11,
        27.348_25,
    ];
    [horner(t, &R), horner(t, &G), horner(t, &B)].map(clamp01)
}

/// Polynomial fit of the Inferno colormap.
fn inferno(t: f32) -> [f32; 3] {
    const R: [f32; 7] = [
        0.000_218_94,
        0.106_513_42,
        11.602_493,
        -41.703_995,
        77.162_94,
        -71.319_43,
        25.131_126,
    ];
    const G: [f32; 7] = [
        0.001_651_004_6,
        0.563_956_44,
        -3.972_854,
        17.436_398,
        -33.402_36,
        32.626_064,
        -12.242_669,
    ];
    const B: [f32; 7] = [
        -0.019_480_898,
        3.932_712_4,
        -15.942_394,
        44.354_145,
        -81.807_31,
        73.209_52,
        -23.070_325,
    ];
    [horner(t, &R), horner(t, &G), horner(t, &B)].map(clamp01)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/colormap.rs"]
mod tests;
