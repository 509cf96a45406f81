pub(crate) mod analytic;
pub(crate) mod backend;
pub(crate) mod crop;
pub(crate) mod frame;
pub(crate) mod outputs;
