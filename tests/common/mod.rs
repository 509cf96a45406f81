#![allow(dead_code)]

use serde_json::{Value, json};

/// Identity rotation, camera at `(tx, 0.5, 3.0)` looking down -Z at the scene origin.
pub fn keyframe(tx: f64) -> Value {
    json!({
        "camera_to_world": [
            1.0, 0.0, 0.0, tx,
            0.0, 1.0, 0.0, 0.5,
            0.0, 0.0, 1.0, 3.0,
            0.0, 0.0, 0.0, 1.0
        ],
        "fov": 50.0,
        "aspect": 1.333
    })
}

pub fn camera_path(width: u32, height: u32, keyframes: usize, seconds: Option<f64>) -> Value {
    let mut path = json!({
        "render_width": width,
        "render_height": height,
        "camera_type": "perspective",
        "camera_path": (0..keyframes).map(|i| keyframe(i as f64)).collect::<Vec<_>>(),
    });
    if let Some(s) = seconds {
        path["seconds"] = json!(s);
    }
    path
}

pub fn ffmpeg_available() -> bool {
    campath::is_ffmpeg_on_path()
}
