pub mod boolean;
pub mod ring;
