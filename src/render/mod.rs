pub(crate) mod cpu;
pub(crate) mod draw;
pub(crate) mod layer;
pub(crate) mod manager;
pub(crate) mod registry;
pub(crate) mod renderers;
