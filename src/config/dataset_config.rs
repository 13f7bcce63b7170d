use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::augment::{FlipPolicy, CROP_HEIGHT, CROP_WIDTH};
use crate::core::dataset::{DatasetSplit, SplitLayout};
use crate::core::label::ClassScheme;
use crate::core::normalize::ChannelStats;
use crate::error::{DatasetError, DatasetResult};

/// Which set of root paths the split directories live under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageProfile {
    /// Workstation copy of the data
    #[default]
    Local,
    /// Notebook-runtime copy of the data
    Colab,
}

/// Root directory for each storage profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageRoots {
    pub local: PathBuf,
    pub colab: PathBuf,
}

impl Default for StorageRoots {
    fn default() -> Self {
        let local = UserDirs::new()
            .and_then(|dirs| dirs.document_dir().map(|d| d.join("Dissertation Data Files")))
            .unwrap_or_else(|| PathBuf::from("data"));
        Self {
            local,
            colab: PathBuf::from("/content/Sat_Image_Dataset"),
        }
    }
}

impl StorageRoots {
    pub fn root(&self, profile: StorageProfile) -> &Path {
        match profile {
            StorageProfile::Local => &self.local,
            StorageProfile::Colab => &self.colab,
        }
    }
}

/// Everything needed to build a dataset.
///
/// Missing fields in a config file fall back to [`DatasetConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Train or test partition
    pub split: DatasetSplit,
    /// Storage root profile
    pub storage: StorageProfile,
    pub roots: StorageRoots,
    /// Standardize channels with `mean`/`std`
    pub normalize: bool,
    pub mean: Option<Vec<f32>>,
    pub std: Option<Vec<f32>>,
    /// Random flip augmentation
    pub flip: bool,
    /// Trigger probability of each flip
    pub flip_prob: f64,
    /// Number of class bins, 6 or 16
    pub classes: u32,
    pub crop_height: usize,
    pub crop_width: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            split: DatasetSplit::Train,
            storage: StorageProfile::Local,
            roots: StorageRoots::default(),
            normalize: false,
            mean: None,
            std: None,
            flip: false,
            flip_prob: 0.25,
            classes: 16,
            crop_height: CROP_HEIGHT,
            crop_width: CROP_WIDTH,
        }
    }
}

/// Validated settings consumed while building and serving the dataset
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOptions {
    pub scheme: ClassScheme,
    pub normalization: Option<ChannelStats>,
    pub flip: Option<FlipPolicy>,
    pub crop_height: usize,
    pub crop_width: usize,
}

impl DatasetConfig {
    /// Default config file location in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "satpop").map(|dirs| dirs.config_dir().join("dataset.json"))
    }

    pub fn root(&self) -> &Path {
        self.roots.root(self.storage)
    }

    pub fn layout(&self) -> SplitLayout {
        SplitLayout::new(self.root(), self.split)
    }

    /// Check the configuration and resolve it into [`DatasetOptions`]
    pub fn validate(&self) -> DatasetResult<DatasetOptions> {
        let scheme = ClassScheme::from_classes(self.classes)?;

        let normalization = if self.normalize {
            match (&self.mean, &self.std) {
                (Some(mean), Some(std)) => Some(ChannelStats::new(mean.clone(), std.clone())?),
                _ => {
                    return Err(DatasetError::InvalidConfig(
                        "normalize requires both mean and std".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        if !(0.0..=1.0).contains(&self.flip_prob) {
            return Err(DatasetError::InvalidConfig(format!(
                "flip_prob must be within [0, 1], got {}",
                self.flip_prob
            )));
        }
        let flip = self.flip.then(|| FlipPolicy::new(self.flip_prob));

        if self.crop_height == 0 || self.crop_width == 0 {
            return Err(DatasetError::InvalidConfig(format!(
                "crop size must be non-zero, got {}x{}",
                self.crop_height, self.crop_width
            )));
        }

        Ok(DatasetOptions {
            scheme,
            normalization,
            flip,
            crop_height: self.crop_height,
            crop_width: self.crop_width,
        })
    }

    /// Load a config from a JSON file
    pub fn load_from(path: &Path) -> DatasetResult<Self> {
        info!("Loading dataset config from: {:?}", path);
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Load the config at [`DatasetConfig::default_path`], or defaults if it is
    /// absent or unreadable
    pub fn load_or_default() -> Self {
        let Some(config_path) = Self::default_path() else {
            warn!("Could not determine config directory. Using defaults.");
            return Self::default();
        };
        if !config_path.exists() {
            info!("No config file at {:?}. Using defaults.", config_path);
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Save the config as pretty-printed JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> DatasetResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Dataset config saved to: {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = DatasetConfig::default();
        assert_eq!(config.split, DatasetSplit::Train);
        assert_eq!(config.storage, StorageProfile::Local);
        assert_eq!(config.flip_prob, 0.25);
        assert_eq!(config.classes, 16);
        assert_eq!((config.crop_height, config.crop_width), (33, 50));
        assert!(!config.normalize && !config.flip);
    }

    #[test]
    fn test_validate_default() {
        let options = DatasetConfig::default().validate().unwrap();
        assert_eq!(options.scheme, ClassScheme::Sixteen);
        assert!(options.normalization.is_none());
        assert!(options.flip.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_classes() {
        let config = DatasetConfig {
            classes: 10,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DatasetError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_normalize_needs_stats() {
        let mut config = DatasetConfig {
            normalize: true,
            mean: Some(vec![0.5]),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.std = Some(vec![0.0]);
        assert!(config.validate().is_err());
        config.std = Some(vec![0.25]);
        let options = config.validate().unwrap();
        assert_eq!(options.normalization.unwrap().std().to_vec(), vec![0.25f32]);
    }

    #[test]
    fn test_validate_flip_prob_range() {
        let mut config = DatasetConfig {
            flip: true,
            flip_prob: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.flip_prob = 0.5;
        assert_eq!(config.validate().unwrap().flip, Some(FlipPolicy::new(0.5)));
    }

    #[test]
    fn test_validate_rejects_zero_crop() {
        let config = DatasetConfig {
            crop_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_storage_profile_selects_root() {
        let config = DatasetConfig {
            storage: StorageProfile::Colab,
            ..Default::default()
        };
        assert_eq!(config.root(), Path::new("/content/Sat_Image_Dataset"));
        assert_eq!(
            config.layout().images_dir,
            PathBuf::from("/content/Sat_Image_Dataset/Train/Images")
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DatasetConfig =
            serde_json::from_str(r#"{ "split": "test", "classes": 6, "storage": "colab" }"#)
                .unwrap();
        assert_eq!(config.split, DatasetSplit::Test);
        assert_eq!(config.classes, 6);
        assert_eq!(config.storage, StorageProfile::Colab);
        assert_eq!(config.flip_prob, 0.25);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dataset.json");
        let config = DatasetConfig {
            flip: true,
            classes: 6,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(DatasetConfig::load_from(&path).unwrap(), config);
    }
}
