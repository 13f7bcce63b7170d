use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const IMAGE_SUFFIX: &str = ".tif";
pub const LABEL_PREFIX: &str = "Index_";
pub const LABEL_SUFFIX: &str = ".gpkg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    #[default]
    Train,
    Test,
}

impl DatasetSplit {
    pub fn as_str(&self) -> &str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Test => "test",
        }
    }

    /// Directory name under the storage root
    pub fn dir_name(&self) -> &str {
        match self {
            DatasetSplit::Train => "Train",
            DatasetSplit::Test => "Test",
        }
    }

    /// Filename prefix of this split's images, followed by the sample index
    pub fn image_prefix(&self) -> &str {
        match self {
            DatasetSplit::Train => "Train Set clipped_Index_",
            DatasetSplit::Test => "Test Set clipped_Index_",
        }
    }
}

/// What a file in a labels directory is, judged by its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelName<'a> {
    /// `Index_<digits>.gpkg`, carrying the digits
    Indexed(&'a str),
    /// A GeoPackage whose name does not follow the template
    Unindexed,
    /// Not a label file
    Other,
}

/// Where one split's images and labels live, and how their names pair up.
///
/// Layout: `<root>/<Split>/Images/<image_prefix><index>.tif` paired with
/// `<root>/<Split>/Labels/Index_<index>.gpkg`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitLayout {
    pub split: DatasetSplit,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl SplitLayout {
    pub fn new(root: &Path, split: DatasetSplit) -> Self {
        let split_dir = root.join(split.dir_name());
        Self {
            split,
            images_dir: split_dir.join("Images"),
            labels_dir: split_dir.join("Labels"),
        }
    }

    /// Classify a labels-directory entry by its file name.
    ///
    /// # Returns
    /// * `LabelName::Indexed("42")` for `Index_42.gpkg`
    /// * `LabelName::Unindexed` for any other `*.gpkg` name, such as `Index_12b.gpkg`
    /// * `LabelName::Other` for names without the `.gpkg` suffix, including
    ///   SQLite sidecars like `Index_3.gpkg-wal`
    pub fn label_name<'a>(&self, file_name: &'a str) -> LabelName<'a> {
        let Some(stem) = file_name.strip_suffix(LABEL_SUFFIX) else {
            return LabelName::Other;
        };
        match stem.strip_prefix(LABEL_PREFIX) {
            Some(index) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
                LabelName::Indexed(index)
            }
            _ => LabelName::Unindexed,
        }
    }

    pub fn image_path(&self, index: &str) -> PathBuf {
        self.images_dir.join(format!(
            "{}{}{}",
            self.split.image_prefix(),
            index,
            IMAGE_SUFFIX
        ))
    }

    pub fn label_path(&self, index: &str) -> PathBuf {
        self.labels_dir
            .join(format!("{}{}{}", LABEL_PREFIX, index, LABEL_SUFFIX))
    }
}
