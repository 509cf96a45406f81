pub(crate) mod colormap;
pub(crate) mod compositor;
