pub(crate) mod annotation;
pub(crate) mod manager;
pub(crate) mod polygon;
pub(crate) mod video;
