use std::fs;
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::grouping::domain::grouping_config::{GroupingConfig, ThresholdTiers};
use crate::grouping::domain::grouping_error::GroupingError;
use crate::shared::constants::{
    DEFAULT_IDENTITY_MIN_COUNT, DEFAULT_IDENTITY_SEPARATOR, DEFAULT_MIN_GROUP_SIZE,
    DEFAULT_OUTPUT_DIR_PREFIX,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] GroupingError),
}

/// How many faces a single image contributes to grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceLimit {
    /// Only the highest-confidence face.
    #[default]
    One,
    /// Every detected face becomes its own descriptor.
    Unbounded,
}

impl FaceLimit {
    pub fn max_faces(self) -> Option<usize> {
        match self {
            FaceLimit::One => Some(1),
            FaceLimit::Unbounded => None,
        }
    }
}

/// Everything a sort run needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    #[serde(flatten)]
    pub grouping: GroupingConfig,
    pub max_faces_per_image: FaceLimit,
    pub min_group_size: usize,
    /// Separator for the filename identity diagnostic; `None` disables it.
    pub identity_separator: Option<char>,
    pub identity_min_count: usize,
    pub output_dir_prefix: String,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            grouping: GroupingConfig::default(),
            max_faces_per_image: FaceLimit::default(),
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            identity_separator: Some(DEFAULT_IDENTITY_SEPARATOR),
            identity_min_count: DEFAULT_IDENTITY_MIN_COUNT,
            output_dir_prefix: DEFAULT_OUTPUT_DIR_PREFIX.to_string(),
        }
    }
}

impl SortConfig {
    /// Defaults for a run whose descriptors are unit-length (ArcFace).
    pub fn for_unit_embeddings() -> Self {
        let mut config = Self::default();
        config.grouping.threshold_tiers = ThresholdTiers::unit_embedding();
        config
    }

    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_over(path, Self::default())
    }

    /// Loads a JSON config file on top of `base`: fields present in the file
    /// replace those of `base`, the rest are kept.
    pub fn load_over(path: &Path, base: SortConfig) -> Result<Self, ConfigError> {
        let parse_err = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let Value::Object(overrides) = serde_json::from_str(&json).map_err(parse_err)? else {
            return Err(parse_err(serde_json::Error::custom(
                "config must be a JSON object",
            )));
        };
        let mut merged = serde_json::to_value(base).map_err(parse_err)?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(overrides);
        }

        let config: SortConfig = serde_json::from_value(merged).map_err(parse_err)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GroupingError> {
        if self.min_group_size == 0 {
            return Err(GroupingError::InvalidConfig(
                "min_group_size must be at least 1".to_string(),
            ));
        }
        if self.output_dir_prefix.contains(['/', '\\']) {
            return Err(GroupingError::InvalidConfig(format!(
                "output_dir_prefix must not contain path separators, got '{}'",
                self.output_dir_prefix
            )));
        }
        Ok(())
    }

    pub fn group_dir_name(&self, group_id: usize) -> String {
        format!("{}{group_id}", self.output_dir_prefix)
    }
}
