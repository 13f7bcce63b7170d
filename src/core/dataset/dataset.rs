//! The indexable dataset and the per-sample augmentation it applies.

use rand::Rng;
use tracing::{info, trace};

use crate::config::{DatasetConfig, DatasetOptions};
use crate::core::augment::{random_crop, FlipOutcome};
use crate::core::dataset::loader::{load_images_and_labels, GeometryRecord, LoadedSplit};
use crate::core::label::ClassifiedLabel;
use crate::core::normalize::normalize;
use crate::core::raster::{Image, RasterBackend, TiffRaster};
use crate::core::vector::{GeoPackageReader, VectorBackend};
use crate::error::{DatasetError, DatasetResult};

/// A single training sample: augmented image and its untouched label
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub image: Image,
    pub label: ClassifiedLabel,
    /// Flip applied to `image`, if any
    pub flip: FlipOutcome,
}

/// An indexed collection of samples.
///
/// Randomness is drawn from the caller's generator, so a dataset can be shared
/// across threads with one generator per consumer.
pub trait Dataset: Send + Sync {
    type Item;

    /// Total number of samples in the dataset.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the sample at position `index`.
    ///
    /// # Errors
    /// `DatasetError::IndexOutOfRange` if `index >= self.len()`.
    fn get<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> DatasetResult<Self::Item>;

    /// Iterate one epoch in index order.
    fn iter<'a, R: Rng + ?Sized>(&'a self, rng: &'a mut R) -> DatasetIter<'a, Self, R>
    where
        Self: Sized,
    {
        DatasetIter {
            dataset: self,
            rng,
            next: 0,
        }
    }
}

/// Epoch iterator returned by [`Dataset::iter`]
pub struct DatasetIter<'a, D, R: ?Sized> {
    dataset: &'a D,
    rng: &'a mut R,
    next: usize,
}

impl<'a, D, R> Iterator for DatasetIter<'a, D, R>
where
    D: Dataset,
    R: Rng + ?Sized,
{
    type Item = DatasetResult<D::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.dataset.len() {
            return None;
        }
        let item = self.dataset.get(self.next, &mut *self.rng);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.dataset.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Check a signed index against a dataset length.
///
/// # Returns
/// * `Ok(usize)` if `0 <= index < len`
/// * `Err(DatasetError::IndexOutOfRange)` otherwise, including any negative index
pub fn resolve_index(index: i64, len: usize) -> DatasetResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(DatasetError::IndexOutOfRange { index, len })
}

/// Satellite image crops paired with classified population labels.
///
/// Images, labels and geometry records are parallel sequences fixed at
/// construction; only `get` draws randomness.
#[derive(Debug, Clone)]
pub struct SatImageDataset {
    images: Vec<Image>,
    labels: Vec<ClassifiedLabel>,
    geometries: Vec<GeometryRecord>,
    options: DatasetOptions,
}

impl SatImageDataset {
    /// Load the split described by `config` from TIFF images and GeoPackage labels
    pub fn load(config: &DatasetConfig) -> DatasetResult<Self> {
        Self::load_with(config, &TiffRaster, &GeoPackageReader)
    }

    /// Load with caller-provided raster and vector backends
    pub fn load_with<R, V>(config: &DatasetConfig, raster: &R, vector: &V) -> DatasetResult<Self>
    where
        R: RasterBackend + ?Sized,
        V: VectorBackend + ?Sized,
    {
        let options = config.validate()?;
        let layout = config.layout();
        info!(
            "Building {} dataset from {:?} ({} classes)",
            config.split.as_str(),
            config.root(),
            options.scheme.num_classes()
        );
        let loaded = load_images_and_labels(&layout, options.scheme, raster, vector)?;
        Self::from_loaded(loaded, options)
    }

    /// Finish construction from an already loaded split, normalizing images
    /// if the options ask for it
    pub fn from_loaded(loaded: LoadedSplit, options: DatasetOptions) -> DatasetResult<Self> {
        let LoadedSplit {
            images,
            labels,
            geometries,
        } = loaded;
        if images.len() != labels.len() || images.len() != geometries.len() {
            return Err(DatasetError::InvalidConfig(format!(
                "mismatched sequences: {} images, {} labels, {} geometries",
                images.len(),
                labels.len(),
                geometries.len()
            )));
        }

        let images = match &options.normalization {
            Some(stats) => {
                info!("Normalizing {} images over {} channels", images.len(), stats.channels());
                normalize(&images, stats)?
            }
            None => images,
        };

        Ok(Self {
            images,
            labels,
            geometries,
            options,
        })
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn labels(&self) -> &[ClassifiedLabel] {
        &self.labels
    }

    pub fn geometries(&self) -> &[GeometryRecord] {
        &self.geometries
    }

    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }
}

impl Dataset for SatImageDataset {
    type Item = Sample;

    fn len(&self) -> usize {
        self.images.len()
    }

    fn get<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> DatasetResult<Sample> {
        let (Some(image), Some(label)) = (self.images.get(index), self.labels.get(index)) else {
            return Err(DatasetError::IndexOutOfRange {
                index: i64::try_from(index).unwrap_or(i64::MAX),
                len: self.len(),
            });
        };

        let cropped = random_crop(
            image,
            self.options.crop_height,
            self.options.crop_width,
            rng,
        );
        let (image, flip) = match &self.options.flip {
            Some(policy) => policy.apply(cropped, rng),
            None => (cropped, FlipOutcome::None),
        };
        trace!("Sample {} cropped to {:?}, flip {:?}", index, image.dim(), flip);

        Ok(Sample {
            image,
            label: label.clone(),
            flip,
        })
    }
}
