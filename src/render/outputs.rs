use std::collections::BTreeMap;

use crate::foundation::error::{CampathError, CampathResult};

/// Named output channels produced by a scene renderer for one view.
pub type RenderOutputs = BTreeMap<String, ChannelImage>;

/// Dense `height x width x channels` float image, row-major, channels interleaved.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<f32>,
}

impl ChannelImage {
    /// Wrap `data` after checking that `channels` is 1 or 3 and the length matches.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<f32>) -> CampathResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(CampathError::shape(format!(
                "channel images must have 1 or 3 channels, got {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(CampathError::shape(format!(
                "channel image data has {} values, expected {expected} for {width}x{height}x{channels}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Image where every pixel is `value`.
    pub fn filled(width: u32, height: u32, value: &[f32]) -> CampathResult<Self> {
        let channels = u8::try_from(value.len())
            .map_err(|_| CampathError::shape("fill value has too many channels"))?;
        let data = value
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * value.len())
            .collect();
        Self::new(width, height, channels, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Values per pixel (1 or 3).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Values of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> &[f32] {
        let c = self.channels as usize;
        let i = (y as usize * self.width as usize + x as usize) * c;
        &self.data[i..i + c]
    }

    /// Stack `self` on top of `bottom`.
    pub fn vstack(mut self, bottom: &ChannelImage) -> CampathResult<Self> {
        if self.width != bottom.width || self.channels != bottom.channels {
            return Err(CampathError::shape(format!(
                "cannot stack {}x{}x{} over {}x{}x{}",
                self.width,
                self.height,
                self.channels,
                bottom.width,
                bottom.height,
                bottom.channels
            )));
        }
        self.data.extend_from_slice(&bottom.data);
        self.height += bottom.height;
        Ok(self)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/outputs.rs"]
mod tests;
