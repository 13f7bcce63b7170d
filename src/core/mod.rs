pub mod analysis;
pub mod augment;
pub mod dataset;
pub mod label;
pub mod normalize;
pub mod raster;
pub mod vector;
