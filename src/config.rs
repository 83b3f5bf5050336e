//! Pipeline configuration loaded from config.json.
//!
//! If the config file doesn't exist or fails to parse, default values are
//! used. The loaded value is passed explicitly into the reader; nothing
//! here is stored globally.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::ConfusionTable;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Image normalization before recognition
    pub preprocess: PreprocessConfig,
    /// Tesseract invocation settings
    pub tesseract: TesseractConfig,
    /// Characters Tesseract commonly misreads in the numeric columns
    pub ocr_confusions: ConfusionTable,
    /// Roster CSV (`name,class,discord_id`)
    pub roster_csv: PathBuf,
    /// Canonical class list, one per row
    pub classes_csv: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Canonical width every screenshot is resized to
    pub width: u32,
    /// Canonical height every screenshot is resized to
    pub height: u32,
    /// Gaussian smoothing sigma, 0 disables the pass
    pub blur_sigma: f32,
    /// Side length of the square dilation kernel
    pub dilate_kernel: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Explicit executable path, searched for when unset
    pub executable: Option<PathBuf>,
    /// Traineddata language
    pub language: String,
    /// Page segmentation mode (6 = single uniform block of text)
    pub psm: u8,
    /// OCR engine mode (3 = default, based on what is available)
    pub oem: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            tesseract: TesseractConfig::default(),
            ocr_confusions: ConfusionTable::default(),
            roster_csv: PathBuf::from("roster.csv"),
            classes_csv: PathBuf::from("classes.csv"),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: 1700,
            height: 1500,
            blur_sigma: 2.0,
            dilate_kernel: 2,
        }
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            executable: None,
            language: "eng".to_string(),
            psm: 6,
            oem: 3,
        }
    }
}

impl PipelineConfig {
    /// Load config from file, or return defaults if the file is missing or invalid.
    pub fn load(config_path: &Path) -> Self {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => {
                        crate::log(&format!("Loaded config from {}", config_path.display()));
                        return config;
                    }
                    Err(e) => {
                        crate::log(&format!("Failed to parse config: {}. Using defaults.", e));
                    }
                },
                Err(e) => {
                    crate::log(&format!("Failed to read config: {}. Using defaults.", e));
                }
            }
        } else {
            crate::log(&format!(
                "{} not found. Using default config.",
                config_path.display()
            ));
        }
        Self::default()
    }

    /// Save default config to file (for reference).
    pub fn save_default(config_path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(config_path, json)?;
        Ok(())
    }
}
