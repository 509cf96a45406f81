use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::foundation::error::{CampathError, CampathResult};
use crate::render::crop::CropSpec;

/// Serialized camera path, as exported by interactive path editors.
///
/// Unknown fields are ignored so editor-specific keys (keyframe handles, smoothness, ...) pass
/// through.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CameraPathDef {
    /// Output height in pixels.
    pub render_height: u32,
    /// Output width in pixels.
    pub render_width: u32,
    /// Projection tag; see [`crate::CameraModel::from_tag`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_type: Option<String>,
    /// Ordered per-frame camera entries.
    pub camera_path: Vec<KeyframeDef>,
    /// Playback duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<f64>,
    /// Optional trajectory-wide crop region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropDef>,
}

/// One entry of [`CameraPathDef::camera_path`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct KeyframeDef {
    /// Row-major 4x4 camera-to-world matrix (16 values).
    pub camera_to_world: Vec<f64>,
    /// Normalized render time, usually in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_time: Option<f64>,
    /// Vertical field of view in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<f64>,
    /// Aspect ratio recorded by the editor. Informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect: Option<f64>,
}

/// Serialized crop region.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CropDef {
    /// Box center in world space.
    pub crop_center: [f64; 3],
    /// Full box extent per axis.
    pub crop_scale: [f64; 3],
    /// Background color, 0..=255 per channel.
    pub crop_bg_color: ColorDef,
}

/// RGB color with 0..=255 channels.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct ColorDef {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl CameraPathDef {
    /// Parse a camera path from a JSON string.
    pub fn from_json_str(s: &str) -> CampathResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| CampathError::malformed(format!("camera path JSON: {e}")))
    }

    /// Read and parse a camera path JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> CampathResult<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("open camera path '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            CampathError::malformed(format!("camera path '{}': {e}", path.display()))
        })
    }

    /// Crop region described by the file, if any.
    pub fn crop_spec(&self) -> Option<CropSpec> {
        self.crop.as_ref().map(|c| {
            let bg = c.crop_bg_color;
            CropSpec {
                center: c.crop_center.into(),
                scale: c.crop_scale.into(),
                background: [
                    (bg.r / 255.0) as f32,
                    (bg.g / 255.0) as f32,
                    (bg.b / 255.0) as f32,
                ],
            }
        })
    }
}
