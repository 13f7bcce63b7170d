//! Per-channel standardization of loaded images.

use ndarray::Axis;
use serde::Serialize;

use crate::core::raster::Image;
use crate::error::{DatasetError, DatasetResult};

/// Per-channel mean and standard deviation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelStats {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl ChannelStats {
    /// Validate statistics before use.
    ///
    /// # Returns
    /// * `Err(DatasetError::InvalidConfig)` if the vectors are empty, differ in
    ///   length, or any std is zero or non-finite
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> DatasetResult<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(DatasetError::InvalidConfig(format!(
                "mean ({} values) and std ({} values) must be non-empty and equal in length",
                mean.len(),
                std.len()
            )));
        }
        if let Some(c) = std.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(DatasetError::InvalidConfig(format!(
                "std for channel {} is {}",
                c, std[c]
            )));
        }
        if let Some(c) = mean.iter().position(|m| !m.is_finite()) {
            return Err(DatasetError::InvalidConfig(format!(
                "mean for channel {} is {}",
                c, mean[c]
            )));
        }
        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    pub fn std(&self) -> &[f32] {
        &self.std
    }

    pub fn channels(&self) -> usize {
        self.mean.len()
    }
}

/// Standardize one image: channel `c` becomes `(x - mean[c]) / std[c]`
pub fn normalize_image(image: &Image, stats: &ChannelStats) -> DatasetResult<Image> {
    let channels = image.len_of(Axis(0));
    if channels > stats.channels() {
        return Err(DatasetError::InvalidConfig(format!(
            "image has {} channels but statistics cover {}",
            channels,
            stats.channels()
        )));
    }
    let mut out = image.clone();
    for (c, mut plane) in out.axis_iter_mut(Axis(0)).enumerate() {
        let (mean, std) = (stats.mean[c], stats.std[c]);
        plane.mapv_inplace(|x| (x - mean) / std);
    }
    Ok(out)
}

/// Standardize every image, returning a new collection
pub fn normalize(images: &[Image], stats: &ChannelStats) -> DatasetResult<Vec<Image>> {
    images
        .iter()
        .map(|image| normalize_image(image, stats))
        .collect()
}
