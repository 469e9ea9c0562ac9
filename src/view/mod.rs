pub(crate) mod camera;
pub(crate) mod pane;
pub(crate) mod playback;
