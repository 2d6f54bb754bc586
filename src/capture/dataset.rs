//! On-disk training samples
//!
//! Layout: `<root>/<LABEL>/<n>.json`, one fixed-shape sequence per file. The
//! training pipeline reads the same layout and skips files with the wrong shape.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::recognition::FeatureVector;

const SAMPLE_EXTENSION: &str = "json";

/// Dataset errors
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid sample JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid label {0:?}")]
    InvalidLabel(String),

    #[error("Sample shape {frames}x{features} does not match {expected_frames}x{expected_features}")]
    Shape {
        frames: usize,
        features: usize,
        expected_frames: usize,
        expected_features: usize,
    },
}

fn io_error(path: &Path, source: std::io::Error) -> DatasetError {
    DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One recorded gesture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub label: String,
    /// `[frames, features]`
    pub shape: [usize; 2],
    pub frames: Vec<Vec<f32>>,
}

impl GestureSample {
    pub fn has_shape(&self, frames: usize, features: usize) -> bool {
        self.shape == [frames, features]
            && self.frames.len() == frames
            && self.frames.iter().all(|f| f.len() == features)
    }
}

/// Per-label sample counts found by [`SampleStore::scan`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub counts: BTreeMap<String, usize>,
    /// Files that could not be read or had the wrong shape
    pub skipped: Vec<PathBuf>,
}

impl DatasetSummary {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Directory-per-label sample store
#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
    sequence_length: usize,
    feature_count: usize,
}

impl SampleStore {
    pub fn new(root: impl Into<PathBuf>, sequence_length: usize, feature_count: usize) -> Self {
        Self {
            root: root.into(),
            sequence_length,
            feature_count,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn label_dir(&self, label: &str) -> Result<PathBuf, DatasetError> {
        let valid = !label.is_empty()
            && label
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(DatasetError::InvalidLabel(label.to_string()));
        }
        Ok(self.root.join(label))
    }

    fn sample_files(dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
            let path = entry.map_err(|e| io_error(dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == SAMPLE_EXTENSION) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Samples already stored for `label`
    pub fn count(&self, label: &str) -> Result<usize, DatasetError> {
        Ok(Self::sample_files(&self.label_dir(label)?)?.len())
    }

    /// Delete every stored sample for `label`
    pub fn clear_label(&self, label: &str) -> Result<usize, DatasetError> {
        let files = Self::sample_files(&self.label_dir(label)?)?;
        for file in &files {
            fs::remove_file(file).map_err(|e| io_error(file, e))?;
        }
        Ok(files.len())
    }

    /// Write one sample and return its path
    pub fn save(&self, label: &str, frames: &[FeatureVector]) -> Result<PathBuf, DatasetError> {
        let features = frames.first().map_or(0, FeatureVector::len);
        if frames.len() != self.sequence_length || frames.iter().any(|f| f.len() != self.feature_count) {
            return Err(DatasetError::Shape {
                frames: frames.len(),
                features,
                expected_frames: self.sequence_length,
                expected_features: self.feature_count,
            });
        }

        let dir = self.label_dir(label)?;
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        // Next free index; survives gaps left by deleted files
        let mut index = Self::sample_files(&dir)?.len();
        let mut path = dir.join(format!("{}.{}", index, SAMPLE_EXTENSION));
        while path.exists() {
            index += 1;
            path = dir.join(format!("{}.{}", index, SAMPLE_EXTENSION));
        }

        let sample = GestureSample {
            label: label.to_string(),
            shape: [self.sequence_length, self.feature_count],
            frames: frames.iter().map(|f| f.as_slice().to_vec()).collect(),
        };
        let json = serde_json::to_string(&sample)?;
        fs::write(&path, json).map_err(|e| io_error(&path, e))?;

        Ok(path)
    }

    /// Read one sample file
    pub fn load(path: &Path) -> Result<GestureSample, DatasetError> {
        let contents = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Count valid samples per label, skipping unreadable or mis-shaped files
    pub fn scan(&self) -> Result<DatasetSummary, DatasetError> {
        let mut summary = DatasetSummary::default();
        if !self.root.exists() {
            return Ok(summary);
        }

        for entry in fs::read_dir(&self.root).map_err(|e| io_error(&self.root, e))? {
            let dir = entry.map_err(|e| io_error(&self.root, e))?.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(label) = dir.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };

            let mut valid = 0;
            for file in Self::sample_files(&dir)? {
                match Self::load(&file) {
                    Ok(sample) if sample.has_shape(self.sequence_length, self.feature_count) => valid += 1,
                    Ok(sample) => {
                        tracing::warn!(path = %file.display(), shape = ?sample.shape, "Skipping sample with wrong shape");
                        summary.skipped.push(file);
                    }
                    Err(e) => {
                        tracing::warn!(path = %file.display(), "Skipping unreadable sample: {}", e);
                        summary.skipped.push(file);
                    }
                }
            }
            summary.counts.insert(label, valid);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize, features: usize) -> Vec<FeatureVector> {
        (0..n)
            .map(|i| FeatureVector::from_flat(&vec![i as f32 + 0.5; features], features).unwrap())
            .collect()
    }

    #[test]
    fn test_save_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path(), 3, 4);

        let first = store.save("HELLO", &frames(3, 4)).unwrap();
        let second = store.save("HELLO", &frames(3, 4)).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.count("HELLO").unwrap(), 2);
        assert_eq!(store.count("NO").unwrap(), 0);

        let sample = SampleStore::load(&first).unwrap();
        assert_eq!(sample.label, "HELLO");
        assert!(sample.has_shape(3, 4));
        assert_eq!(sample.frames[2][0], 2.5);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path(), 3, 4);
        let err = store.save("HELLO", &frames(2, 4)).unwrap_err();
        assert!(matches!(err, DatasetError::Shape { frames: 2, .. }));
    }

    #[test]
    fn test_label_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path(), 3, 4);
        assert!(matches!(
            store.save("../etc", &frames(3, 4)),
            Err(DatasetError::InvalidLabel(_))
        ));
    }

    #[test]
    fn test_scan_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path(), 3, 4);
        store.save("YES", &frames(3, 4)).unwrap();
        store.save("NO", &frames(3, 4)).unwrap();

        // A sample written with a different sequence length
        SampleStore::new(dir.path(), 2, 4).save("NO", &frames(2, 4)).unwrap();
        fs::write(dir.path().join("NO").join("broken.json"), "{").unwrap();

        let summary = store.scan().unwrap();
        assert_eq!(summary.counts.get("YES"), Some(&1));
        assert_eq!(summary.counts.get("NO"), Some(&1));
        assert_eq!(summary.skipped.len(), 2);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_clear_label() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::new(dir.path(), 3, 4);
        store.save("YES", &frames(3, 4)).unwrap();
        assert_eq!(store.clear_label("YES").unwrap(), 1);
        assert_eq!(store.count("YES").unwrap(), 0);
    }
}
