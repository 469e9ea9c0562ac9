pub(crate) mod annotation;
pub(crate) mod commands;
pub(crate) mod item;
pub(crate) mod measure;
pub(crate) mod overlay;
pub(crate) mod plugin;
pub(crate) mod tool;
