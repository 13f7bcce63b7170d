//! # satpop
//!
//! Satellite image / population label dataset for classification training.
//!
//! This crate provides:
//! - [`SatImageDataset`]: eagerly loaded image crops paired with classified labels
//! - Label classification into 6 or 16 population bins
//! - Per-channel normalization and channel statistics
//! - Random crop and flip augmentation driven by a caller-supplied RNG
//! - TIFF raster and GeoPackage vector readers behind swappable traits

pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use crate::config::{DatasetConfig, DatasetOptions, StorageProfile, StorageRoots};
pub use crate::core::augment::{
    horizontal_flip, random_crop, vertical_flip, FlipOutcome, FlipPolicy, CROP_HEIGHT, CROP_WIDTH,
};
pub use crate::core::dataset::{
    resolve_index, Dataset, DatasetSplit, LoadedSplit, Sample, SatImageDataset, SplitLayout,
};
pub use crate::core::label::{classify, leading_count, ClassScheme, ClassifiedLabel, RawLabel};
pub use crate::core::normalize::{normalize, normalize_image, ChannelStats};
pub use crate::core::raster::{Image, RasterBackend, TiffRaster};
pub use crate::core::vector::{GeoPackageReader, Geometry, LabelRecords, VectorBackend};
pub use crate::error::{DatasetError, DatasetResult};
