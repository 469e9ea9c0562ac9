pub(crate) mod annotation;
pub(crate) mod shapes;
pub(crate) mod sub;
pub(crate) mod video;
