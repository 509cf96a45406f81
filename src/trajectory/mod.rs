pub(crate) mod builder;
pub(crate) mod path_def;
pub(crate) mod spiral;
