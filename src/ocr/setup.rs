use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Command;

/// Returns the per-user directory for storing Tesseract files
pub fn get_user_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("culvert-ocr")
        .join("tesseract")
}

fn executable_name() -> &'static str {
    if cfg!(windows) {
        "tesseract.exe"
    } else {
        "tesseract"
    }
}

/// Directories to look in before falling back to `PATH`.
fn local_tesseract_dirs() -> Vec<PathBuf> {
    vec![crate::paths::get_tesseract_dir(), get_user_tesseract_dir()]
}

const COMMON_INSTALL_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
    "/usr/bin",
    "/usr/local/bin",
    "/opt/homebrew/bin",
];

const COMMON_TESSDATA_DIRS: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Finds the Tesseract executable, checking local dirs first, then PATH, then
/// common install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    for dir in local_tesseract_dirs() {
        let exe = dir.join(executable_name());
        if exe.exists() {
            return Ok(exe);
        }
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in COMMON_INSTALL_DIRS {
        let p = PathBuf::from(dir).join(executable_name());
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR or copy it to {}",
        crate::paths::get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory containing `<language>.traineddata`.
pub fn find_tessdata_dir(language: &str) -> Result<PathBuf> {
    let traineddata = format!("{}.traineddata", language);

    let mut candidates: Vec<PathBuf> = local_tesseract_dirs()
        .into_iter()
        .map(|dir| dir.join("tessdata"))
        .collect();

    // TESSDATA_PREFIX may point at tessdata itself or at its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }

    candidates.extend(COMMON_TESSDATA_DIRS.iter().map(PathBuf::from));

    candidates
        .into_iter()
        .find(|dir| dir.join(&traineddata).exists())
        .ok_or_else(|| anyhow!("tessdata directory with {} not found", traineddata))
}
