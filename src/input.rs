//! Loading screenshots and caller-supplied capture dates.

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use std::path::PathBuf;

/// Where a screenshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
}

impl ImageSource {
    /// `http://` and `https://` arguments are URLs, anything else a file path.
    pub fn parse(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            ImageSource::Url(arg.to_string())
        } else {
            ImageSource::Path(PathBuf::from(arg))
        }
    }

    /// Reads the raw, still-encoded image bytes.
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Path(path) => std::fs::read(path)
                .context(format!("Failed to read screenshot: {}", path.display())),
            ImageSource::Url(url) => fetch(url),
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let response = client
        .get(url)
        .header("User-Agent", "culvert-ocr")
        .send()
        .context(format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        return Err(anyhow!("Failed to download {}: HTTP {}", url, response.status()));
    }

    let bytes = response.bytes()?;
    crate::log(&format!("Downloaded {} ({} bytes)", url, bytes.len()));
    Ok(bytes.to_vec())
}

/// Capture date for a run: the override if given (`YYYY-MM-DD`), otherwise
/// today's UTC date.
pub fn capture_date(override_date: Option<&str>) -> Result<NaiveDate> {
    match override_date {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| anyhow!("Enter the date in this format: YYYY-MM-DD (got {:?})", text)),
        None => Ok(Utc::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ImageSource::parse("https://cdn.example.com/a.png"),
            ImageSource::Url("https://cdn.example.com/a.png".to_string())
        );
        assert_eq!(
            ImageSource::parse("shots/page1.png"),
            ImageSource::Path(PathBuf::from("shots/page1.png"))
        );
    }

    #[test]
    fn test_load_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let bytes = ImageSource::Path(file.path().to_path_buf()).load().unwrap();
        assert_eq!(bytes, b"\x89PNG");
    }

    #[test]
    fn test_load_missing_path() {
        let source = ImageSource::Path(PathBuf::from("/definitely/not/here.png"));
        assert!(source.load().is_err());
    }

    #[test]
    fn test_capture_date_override() {
        assert_eq!(
            capture_date(Some("2023-10-16")).unwrap(),
            NaiveDate::from_ymd_opt(2023, 10, 16).unwrap()
        );
        assert!(capture_date(Some("16/10/2023")).is_err());
        assert!(capture_date(Some("2023-02-30")).is_err());
        assert_eq!(capture_date(None).unwrap(), Utc::now().date_naive());
    }
}
