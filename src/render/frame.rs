use crate::camera::model::{CameraModel, CameraView};
use crate::foundation::error::{CampathError, CampathResult};
use crate::render::backend::SceneRenderer;
use crate::render::crop::CropContext;
use crate::render::outputs::RenderOutputs;

/// Renders one trajectory frame through a [`SceneRenderer`].
///
/// Omnidirectional stereo frames are rendered once per eye and every channel is stacked
/// left-over-right, so a stereo frame is twice as tall as its intrinsics.
pub struct FrameRenderer<'a> {
    renderer: &'a mut dyn SceneRenderer,
}

impl<'a> FrameRenderer<'a> {
    /// Wrap a scene renderer for the duration of a run.
    pub fn new(renderer: &'a mut dyn SceneRenderer) -> Self {
        Self { renderer }
    }

    /// Render all channels for `view`, with `crop` applied to this call only.
    pub fn render(
        &mut self,
        view: &CameraView,
        crop: Option<&CropContext>,
    ) -> CampathResult<RenderOutputs> {
        if !view.model.is_omni_stereo() {
            return self.renderer.render_view(view, crop);
        }

        let left = self
            .renderer
            .render_view(&view.with_model(CameraModel::OmniStereoLeft), crop)?;
        let mut right = self
            .renderer
            .render_view(&view.with_model(CameraModel::OmniStereoRight), crop)?;

        let mut stacked = RenderOutputs::new();
        for (name, top) in left {
            let Some(bottom) = right.remove(&name) else {
                tracing::debug!(channel = %name, "channel missing from right eye; dropped");
                continue;
            };
            let image = top.vstack(&bottom).map_err(|e| {
                CampathError::shape(format!("stereo channel '{name}': {e}"))
            })?;
            stacked.insert(name, image);
        }
        Ok(stacked)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
