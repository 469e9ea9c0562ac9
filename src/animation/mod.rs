pub(crate) mod interpolate;
