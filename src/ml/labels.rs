//! Label map loading
//!
//! The training pipeline writes `{"0": "HELLO", "1": "NO", ...}`. Indices must
//! cover `0..n` without gaps so every classifier output has a label.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Label map errors
#[derive(Debug, thiserror::Error)]
pub enum LabelMapError {
    #[error("Label map not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read label map: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse label map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Label map key is not a class index: {0:?}")]
    InvalidIndex(String),

    #[error("Label map is missing class index {0}")]
    MissingIndex(usize),

    #[error("Label map is empty")]
    Empty,
}

/// Class index to label, immutable after load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from labels in class-index order
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, LabelMapError> {
        if !path.exists() {
            return Err(LabelMapError::NotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, LabelMapError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        if raw.is_empty() {
            return Err(LabelMapError::Empty);
        }

        let mut indexed = BTreeMap::new();
        for (key, label) in raw {
            let index: usize = key
                .trim()
                .parse()
                .map_err(|_| LabelMapError::InvalidIndex(key.clone()))?;
            indexed.insert(index, label);
        }

        let mut labels = Vec::with_capacity(indexed.len());
        for (expected, (index, label)) in indexed.into_iter().enumerate() {
            if index != expected {
                return Err(LabelMapError::MissingIndex(expected));
            }
            labels.push(label);
        }

        Ok(Self { labels })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
