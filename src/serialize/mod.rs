pub(crate) mod builtin;
pub(crate) mod payload;
pub(crate) mod registry;
