pub mod descriptor_to_model;
pub mod mock;
pub mod paths;
pub mod servers;

pub use descriptor_to_model::{ConvertOptions, convert, convert_with_options};
