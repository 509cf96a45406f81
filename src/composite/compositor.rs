use crate::composite::colormap::{ColormapOptions, apply_colormap};
use crate::foundation::error::{CampathError, CampathResult};
use crate::render::outputs::RenderOutputs;

/// Displayable RGB8 frame, tightly packed, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CompositeFrame {
    /// Wrap RGB8 bytes after checking the length against `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> CampathResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(CampathError::shape(format!(
                "frame data has {} bytes, expected {expected} for {width}x{height} rgb8",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGB8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame, returning its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// RGB value of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Result of compositing one frame.
#[derive(Clone, Debug)]
pub struct Composited {
    /// Channels concatenated left to right in request order.
    pub frame: CompositeFrame,
    /// Requested channels absent from the outputs, in request order.
    pub missing: Vec<String>,
    /// Channel names the outputs did contain.
    pub available: Vec<String>,
}

/// Colormap each requested channel and concatenate them along the width axis.
///
/// Absent channels are skipped and listed in [`Composited::missing`]; the caller decides whether
/// that is fatal. Fails when no requested channel is present or when heights disagree.
pub fn composite_frame<S: AsRef<str>>(
    outputs: &RenderOutputs,
    channels: &[S],
    opts: &ColormapOptions,
) -> CampathResult<Composited> {
    if channels.is_empty() {
        return Err(CampathError::malformed("no output channels requested"));
    }

    let available: Vec<String> = outputs.keys().cloned().collect();
    let mut missing = Vec::new();
    let mut mapped = Vec::with_capacity(channels.len());
    for name in channels {
        let name = name.as_ref();
        match outputs.get(name) {
            Some(image) => {
                let rgb = apply_colormap(image, opts)?;
                mapped.push((name, image.width(), image.height(), rgb));
            }
            None => missing.push(name.to_owned()),
        }
    }

    let Some(&(first_name, _, height, _)) = mapped.first() else {
        return Err(CampathError::channel_not_found(
            channels[0].as_ref(),
            available,
        ));
    };
    if let Some((name, _, h, _)) = mapped.iter().find(|(_, _, h, _)| *h != height) {
        return Err(CampathError::shape(format!(
            "channel '{name}' has height {h}, but '{first_name}' has height {height}"
        )));
    }

    let total_width: u32 = mapped.iter().map(|(_, w, _, _)| *w).sum();
    let mut data = Vec::with_capacity(total_width as usize * height as usize * 3);
    for y in 0..height as usize {
        for (_, w, _, rgb) in &mapped {
            let row = *w as usize * 3;
            data.extend(rgb[y * row..(y + 1) * row].iter().map(|&v| quantize(v)));
        }
    }

    Ok(Composited {
        frame: CompositeFrame::new(total_width, height, data)?,
        missing,
        available,
    })
}

/// `[0, 1]` float to u8; NaN maps to 0.
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
