use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use crate::config::TesseractConfig;
use crate::error::ReadError;

/// Converts a preprocessed image into text lines, ordered top to bottom.
///
/// Implementations make no promise beyond line order and line boundaries:
/// no bounding boxes, no confidences.
pub trait TextRecognizer {
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>, ReadError>;
}

/// Runs the Tesseract executable as a subprocess.
#[derive(Debug, Clone)]
pub struct Tesseract {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
    psm: u8,
    oem: u8,
}

impl Tesseract {
    /// Locates Tesseract and its traineddata according to `config`.
    ///
    /// A missing tessdata directory is not fatal: Tesseract then falls back
    /// to its compiled-in search path.
    pub fn from_config(config: &TesseractConfig) -> anyhow::Result<Self> {
        let executable = match &config.executable {
            Some(path) => path.clone(),
            None => find_tesseract_executable()?,
        };
        let tessdata = find_tessdata_dir(&config.language).ok();

        crate::log(&format!(
            "Using Tesseract at {} (tessdata: {})",
            executable.display(),
            tessdata
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "default".to_string())
        ));

        Ok(Self {
            executable,
            tessdata,
            language: config.language.clone(),
            psm: config.psm,
            oem: config.oem,
        })
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(&self, img: &GrayImage) -> Result<Vec<String>, ReadError> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")
            .map_err(|e| ReadError::Recognition(format!("Failed to create temp file: {}", e)))?;
        img.save(temp_input.path())
            .map_err(|e| ReadError::Recognition(format!("Failed to write temp image: {}", e)))?;

        let mut command = Command::new(&self.executable);
        command.arg(temp_input.path()).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.language)
            .arg("--oem")
            .arg(self.oem.to_string())
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .map_err(|e| ReadError::Recognition(format!("Failed to run Tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReadError::Recognition(format!("Tesseract failed: {}", stderr)));
        }

        Ok(split_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Splits raw recognizer output into lines, keeping blank ones.
///
/// Blank-line filtering belongs to the parser so that line indices stay
/// meaningful to it.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(|line| line.to_string()).collect()
}
