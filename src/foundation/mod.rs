pub(crate) mod callback;
pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod input;
pub(crate) mod notice;
pub(crate) mod registry;
