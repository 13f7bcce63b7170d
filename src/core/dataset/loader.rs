//! Eager loading of a split: label listing, image pairing and classification.

use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

use crate::core::dataset::split::{LabelName, SplitLayout, LABEL_PREFIX, LABEL_SUFFIX};
use crate::core::label::{classify, ClassScheme, ClassifiedLabel, RawLabel};
use crate::core::raster::{Image, RasterBackend};
use crate::core::vector::{Geometry, VectorBackend};
use crate::error::{DatasetError, DatasetResult};

/// Region indices of one sample with their geometries, kept for spatial analysis
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub indices: Vec<f64>,
    pub geometries: Vec<Option<Geometry>>,
}

/// One label file found in a split's labels directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFile {
    pub index: String,
    pub path: PathBuf,
}

/// Fully loaded split, before it is turned into a dataset.
///
/// The i-th image, label and geometry record come from the same file pair.
#[derive(Debug, Clone, Default)]
pub struct LoadedSplit {
    pub images: Vec<Image>,
    pub labels: Vec<ClassifiedLabel>,
    pub geometries: Vec<GeometryRecord>,
}

impl LoadedSplit {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// List the label files of a split, sorted by numeric index.
///
/// Entries without the `.gpkg` suffix (sidecars, notes) are skipped. A
/// GeoPackage whose name is not `Index_<digits>.gpkg` fails the listing with
/// `MalformedRecord`, since it cannot be paired with an image.
pub fn list_label_files(layout: &SplitLayout) -> DatasetResult<Vec<LabelFile>> {
    info!("Reading label files from: {:?}", layout.labels_dir);
    let mut files = Vec::new();
    for entry in fs::read_dir(&layout.labels_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            warn!("Skipping label entry with non UTF-8 name: {:?}", path);
            continue;
        };
        match layout.label_name(name) {
            LabelName::Indexed(index) => files.push(LabelFile {
                index: index.to_string(),
                path: path.clone(),
            }),
            LabelName::Unindexed => {
                let reason = format!(
                    "label file name does not match {}<digits>{}",
                    LABEL_PREFIX, LABEL_SUFFIX
                );
                return Err(DatasetError::malformed(path.clone(), reason));
            }
            LabelName::Other => warn!("Skipping file that is not a label: {:?}", path),
        }
    }

    files.sort_by(|a, b| {
        let key = |f: &LabelFile| f.index.parse::<u64>().unwrap_or(u64::MAX);
        key(a).cmp(&key(b)).then_with(|| a.path.cmp(&b.path))
    });
    info!("Found {} label files in {:?}", files.len(), layout.labels_dir);
    Ok(files)
}

/// Load every image/label pair of a split.
///
/// For each label file the paired image is read through `raster` and the
/// label through `vector`; the population counts are classified with
/// `scheme`. Any failure aborts the whole load.
#[instrument(name = "load_images_and_labels", skip_all, fields(split = layout.split.as_str()))]
pub fn load_images_and_labels<R, V>(
    layout: &SplitLayout,
    scheme: ClassScheme,
    raster: &R,
    vector: &V,
) -> DatasetResult<LoadedSplit>
where
    R: RasterBackend + ?Sized,
    V: VectorBackend + ?Sized,
{
    let label_files = list_label_files(layout)?;
    let mut loaded = LoadedSplit {
        images: Vec::with_capacity(label_files.len()),
        labels: Vec::with_capacity(label_files.len()),
        geometries: Vec::with_capacity(label_files.len()),
    };

    for label_file in &label_files {
        let image_path = layout.image_path(&label_file.index);
        if !image_path.is_file() {
            return Err(DatasetError::ImageNotFound(image_path));
        }
        let image = raster.read(&image_path)?;

        let records = vector.read(&label_file.path)?;
        let raw = RawLabel::new(&records.indices, &records.populations)
            .map_err(|e| DatasetError::malformed(&label_file.path, e.to_string()))?;
        let label = classify(&raw, scheme);
        debug!(
            "Loaded sample {} with shape {:?}, {} regions, class {}",
            label_file.index,
            image.dim(),
            records.len(),
            label.class_id()
        );

        loaded.images.push(image);
        loaded.labels.push(label);
        loaded.geometries.push(GeometryRecord {
            indices: records.indices,
            geometries: records.geometries,
        });
    }

    info!(
        "Loaded {} samples for split {}",
        loaded.len(),
        layout.split.as_str()
    );
    Ok(loaded)
}
