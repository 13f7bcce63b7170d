mod dataset;
mod loader;
mod split;

pub use dataset::{resolve_index, Dataset, DatasetIter, Sample, SatImageDataset};
pub use loader::{list_label_files, load_images_and_labels, GeometryRecord, LabelFile, LoadedSplit};
pub use split::{DatasetSplit, LabelName, SplitLayout, IMAGE_SUFFIX, LABEL_PREFIX, LABEL_SUFFIX};
