//! Settings management for the recognizer
//!
//! Settings live in an XML file. A missing file means defaults; a file that
//! exists but does not parse or validate is a startup error.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::RecorderConfig;
use crate::recognition::{RecognizerConfig, FEATURE_COUNT, HAND_FEATURES};
use crate::telemetry::LogConfig;

/// Longest hands-down pause accepted as the end of a gesture
const MAX_ABSENCE_SECS: f32 = 600.0;

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind
    #[serde(rename = "bindAddress")]
    pub bind_address: String,

    /// Listen port
    #[serde(rename = "port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Word (dynamic gesture) model and recognizer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordSettings {
    #[serde(rename = "modelPath")]
    pub model_path: PathBuf,

    #[serde(rename = "labelMapPath")]
    pub label_map_path: PathBuf,

    /// Frames per classification window
    #[serde(rename = "sequenceLength")]
    pub sequence_length: usize,

    #[serde(rename = "featureCount")]
    pub feature_count: usize,

    #[serde(rename = "confidenceThreshold")]
    pub confidence_threshold: f32,

    /// Qualifying windows in the majority vote
    #[serde(rename = "smoothingWindow")]
    pub smoothing_window: usize,

    /// Frames with fewer non-zero components are skipped
    #[serde(rename = "minNonzeroFeatures")]
    pub min_nonzero_features: usize,
}

impl Default for WordSettings {
    fn default() -> Self {
        let recognizer = RecognizerConfig::default();
        Self {
            model_path: PathBuf::from("models/word_model.onnx"),
            label_map_path: PathBuf::from("models/word_label_map.json"),
            sequence_length: recognizer.sequence_length,
            feature_count: recognizer.feature_count,
            confidence_threshold: recognizer.confidence_threshold,
            smoothing_window: recognizer.smoothing_window,
            min_nonzero_features: recognizer.min_nonzero_features,
        }
    }
}

impl WordSettings {
    pub fn recognizer_config(&self) -> RecognizerConfig {
        RecognizerConfig {
            sequence_length: self.sequence_length,
            feature_count: self.feature_count,
            confidence_threshold: self.confidence_threshold,
            smoothing_window: self.smoothing_window,
            min_nonzero_features: self.min_nonzero_features,
        }
    }
}

/// Letter (static sign) model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterSettings {
    #[serde(rename = "modelPath")]
    pub model_path: PathBuf,

    #[serde(rename = "labelMapPath")]
    pub label_map_path: PathBuf,

    /// One hand by default
    #[serde(rename = "featureCount")]
    pub feature_count: usize,

    #[serde(rename = "confidenceThreshold")]
    pub confidence_threshold: f32,
}

impl Default for LetterSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/letter_model.onnx"),
            label_map_path: PathBuf::from("models/letter_label_map.json"),
            feature_count: HAND_FEATURES,
            confidence_threshold: 0.0,
        }
    }
}

/// Training data capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    #[serde(rename = "dataDir")]
    pub data_dir: PathBuf,

    /// Frames per recorded sample. Defaults to 15 like the training pipeline,
    /// which is shorter than the word window; see [`RecognizerSettings::warnings`].
    #[serde(rename = "sequenceLength")]
    pub sequence_length: usize,

    /// Hands-down seconds that end a gesture
    #[serde(rename = "absenceSecs")]
    pub absence_secs: f32,

    #[serde(rename = "minHands")]
    pub min_hands: usize,

    #[serde(rename = "maxHands")]
    pub max_hands: usize,

    #[serde(rename = "stabilizerWindow")]
    pub stabilizer_window: usize,

    #[serde(rename = "samplesPerLabel")]
    pub samples_per_label: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/word_sequences"),
            sequence_length: 15,
            absence_secs: 2.0,
            min_hands: 1,
            max_hands: 2,
            stabilizer_window: 15,
            samples_per_label: 50,
        }
    }
}

impl CaptureSettings {
    pub fn recorder_config(&self) -> RecorderConfig {
        RecorderConfig {
            sequence_length: self.sequence_length,
            absence: Duration::try_from_secs_f32(self.absence_secs)
                .unwrap_or_else(|_| RecorderConfig::default().absence),
            min_hands: self.min_hands,
            max_hands: self.max_hands,
            stabilizer_window: self.stabilizer_window,
        }
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    #[serde(rename = "level")]
    pub level: String,

    #[serde(rename = "json")]
    pub json: bool,

    /// Also write logs to this file
    #[serde(rename = "file", skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl LoggingSettings {
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            console_enabled: true,
            file_enabled: self.file.is_some(),
            file_path: self.file.clone(),
            json_format: self.json,
            default_level: self.level.clone(),
        }
    }
}

/// Complete settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename = "SignRecognizer", default)]
pub struct RecognizerSettings {
    #[serde(rename = "server")]
    pub server: ServerSettings,

    #[serde(rename = "word")]
    pub word: WordSettings,

    /// Letter endpoint is disabled when absent
    #[serde(rename = "letter", skip_serializing_if = "Option::is_none")]
    pub letter: Option<LetterSettings>,

    #[serde(rename = "capture")]
    pub capture: CaptureSettings,

    #[serde(rename = "logging")]
    pub logging: LoggingSettings,
}

impl RecognizerSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("SignRecognizer");
            p.push("settings.xml");
            p
        })
    }

    /// Load from an explicit path, or from the default location if it exists,
    /// or fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load and validate an XML settings file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
        let settings: Self = from_str(&contents).map_err(SettingsError::XmlParse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to an XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }

        let xml = to_string(self).map_err(SettingsError::XmlWrite)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);

        fs::write(path, formatted).map_err(SettingsError::Io)?;
        Ok(())
    }

    /// Reject values the recognizer cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let word = &self.word;
        if word.sequence_length == 0 {
            return Err(SettingsError::Invalid("word.sequenceLength must be at least 1".into()));
        }
        if word.smoothing_window == 0 {
            return Err(SettingsError::Invalid("word.smoothingWindow must be at least 1".into()));
        }
        if word.feature_count == 0 || word.feature_count > FEATURE_COUNT * 4 {
            return Err(SettingsError::Invalid(format!(
                "word.featureCount {} is out of range",
                word.feature_count
            )));
        }
        check_threshold("word.confidenceThreshold", word.confidence_threshold)?;

        if let Some(letter) = &self.letter {
            if letter.feature_count == 0 {
                return Err(SettingsError::Invalid("letter.featureCount must be at least 1".into()));
            }
            check_threshold("letter.confidenceThreshold", letter.confidence_threshold)?;
        }

        let capture = &self.capture;
        if capture.sequence_length == 0 {
            return Err(SettingsError::Invalid("capture.sequenceLength must be at least 1".into()));
        }
        if capture.min_hands == 0 || capture.min_hands > capture.max_hands || capture.max_hands > 2 {
            return Err(SettingsError::Invalid(format!(
                "capture hand range {}..={} must lie within 1..=2",
                capture.min_hands, capture.max_hands
            )));
        }
        if !(0.0..=MAX_ABSENCE_SECS).contains(&capture.absence_secs) {
            return Err(SettingsError::Invalid(format!(
                "capture.absenceSecs must be within [0, {}], got {}",
                MAX_ABSENCE_SECS, capture.absence_secs
            )));
        }

        Ok(())
    }

    /// Settings that load but will not work together.
    ///
    /// Samples are recorded with `capture.sequenceLength` frames, so a word model
    /// trained on them expects that many frames per window.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.capture.sequence_length != self.word.sequence_length {
            warnings.push(format!(
                "capture.sequenceLength ({}) differs from word.sequenceLength ({}); models trained on recorded samples will not load",
                self.capture.sequence_length, self.word.sequence_length
            ));
        }
        if self.word.feature_count != FEATURE_COUNT {
            warnings.push(format!(
                "word.featureCount ({}) differs from the {} features recorded per frame",
                self.word.feature_count, FEATURE_COUNT
            ));
        }
        warnings
    }
}

fn check_threshold(name: &str, value: f32) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::Invalid(format!("{} must be within [0, 1], got {}", name, value)))
    }
}

/// Settings-related errors
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    XmlParse(quick_xml::DeError),
    XmlWrite(quick_xml::SeError),
    Invalid(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::XmlParse(e) => write!(f, "XML parse error: {}", e),
            SettingsError::XmlWrite(e) => write!(f, "XML write error: {}", e),
            SettingsError::Invalid(msg) => write!(f, "Invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RecognizerSettings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.word.sequence_length, 20);
        assert_eq!(settings.word.feature_count, 126);
        assert_eq!(settings.word.confidence_threshold, 0.85);
        assert_eq!(settings.word.smoothing_window, 3);
        assert!(settings.letter.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<SignRecognizer>
  <server><port>9100</port></server>
  <word><sequenceLength>15</sequenceLength><confidenceThreshold>0.8</confidenceThreshold></word>
</SignRecognizer>"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        fs::write(&path, xml).unwrap();

        let settings = RecognizerSettings::load_from_file(&path).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.bind_address, "0.0.0.0");
        assert_eq!(settings.word.sequence_length, 15);
        assert_eq!(settings.word.confidence_threshold, 0.8);
        assert_eq!(settings.word.smoothing_window, 3);
        assert_eq!(settings.capture.absence_secs, 2.0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.xml");

        let mut settings = RecognizerSettings::default();
        settings.word.smoothing_window = 5;
        settings.letter = Some(LetterSettings::default());
        settings.save_to_file(&path).unwrap();

        let loaded = RecognizerSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_invalid_threshold() {
        let mut settings = RecognizerSettings::default();
        settings.word.confidence_threshold = 1.5;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_invalid_hand_range() {
        let mut settings = RecognizerSettings::default();
        settings.capture.min_hands = 2;
        settings.capture.max_hands = 1;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_absence_bounded() {
        let mut settings = RecognizerSettings::default();
        settings.capture.absence_secs = 1e30;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

        settings.capture.absence_secs = f32::NAN;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

        settings.capture.absence_secs = 0.5;
        assert!(settings.validate().is_ok());
        assert_eq!(settings.capture.recorder_config().absence, Duration::from_millis(500));
    }

    #[test]
    fn test_sequence_length_mismatch_warns() {
        let mut settings = RecognizerSettings::default();
        assert_eq!(settings.warnings().len(), 1);

        settings.word.sequence_length = settings.capture.sequence_length;
        assert!(settings.warnings().is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = RecognizerSettings::load_or_default(Some(Path::new("/nonexistent/settings.xml")));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }
}
