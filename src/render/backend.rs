use crate::camera::model::CameraView;
use crate::foundation::error::CampathResult;
use crate::render::crop::CropContext;
use crate::render::outputs::RenderOutputs;

/// The scene model: turns one camera view into named output channels.
///
/// Implementations own whatever device state they need; the pipeline only calls `render_view`
/// once per frame, in trajectory order. `crop` is scoped to the single call.
pub trait SceneRenderer {
    /// Render every channel the model produces for `view`.
    fn render_view(
        &mut self,
        view: &CameraView,
        crop: Option<&CropContext>,
    ) -> CampathResult<RenderOutputs>;
}

impl<F> SceneRenderer for F
where
    F: FnMut(&CameraView, Option<&CropContext>) -> CampathResult<RenderOutputs>,
{
    fn render_view(
        &mut self,
        view: &CameraView,
        crop: Option<&CropContext>,
    ) -> CampathResult<RenderOutputs> {
        self(view, crop)
    }
}
