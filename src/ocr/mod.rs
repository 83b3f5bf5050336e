pub mod category;
pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use category::{category_similarity, CategoryVocabulary};
pub use engine::{Tesseract, TextRecognizer};
pub use extract::{ConfusionTable, LineParser, ParsedEntry};
pub use preprocess::{decode_image, preprocess};

use crate::config::PreprocessConfig;
use crate::error::ReadError;
use crate::log;

/// Most screenshots a single batch accepts.
pub const MAX_SCREENSHOTS: usize = 12;

/// Runs screenshots through preprocess → recognize → parse → check.
///
/// Holds only read-only inputs, so one reader can serve any number of
/// screenshots.
pub struct ScoreboardReader<'a, R> {
    recognizer: R,
    preprocess: &'a PreprocessConfig,
    parser: LineParser<'a>,
}

impl<'a, R: TextRecognizer> ScoreboardReader<'a, R> {
    pub fn new(recognizer: R, preprocess: &'a PreprocessConfig, parser: LineParser<'a>) -> Self {
        Self {
            recognizer,
            preprocess,
            parser,
        }
    }

    /// High-level function: encoded screenshot → parsed rows.
    ///
    /// Fails as a whole if the image can't be decoded or if any non-empty
    /// line could not be parsed.
    pub fn read_scoreboard(&self, bytes: &[u8]) -> Result<Vec<ParsedEntry>, ReadError> {
        let img = decode_image(bytes)?;
        log(&format!(
            "Decoded {}x{} screenshot, normalizing to {}x{}",
            img.width(),
            img.height(),
            self.preprocess.width,
            self.preprocess.height
        ));

        let binary = preprocess(&img, self.preprocess);
        let lines = self.recognizer.recognize(&binary)?;
        log(&format!("Recognized {} lines", lines.len()));

        let entries = self.parser.extract_entries(&lines)?;
        log(&format!(
            "Parsed {} entries (captured {})",
            entries.len(),
            self.parser.capture_date()
        ));
        Ok(entries)
    }

    /// Reads an ordered set of optional screenshot slots.
    ///
    /// At most [`MAX_SCREENSHOTS`] slots are accepted. Empty slots are
    /// skipped. Entries are concatenated in slot order. The
    /// first failing screenshot aborts the batch and is reported by its
    /// 1-based slot number.
    pub fn read_scoreboards(&self, slots: &[Option<&[u8]>]) -> Result<Vec<ParsedEntry>, ReadError> {
        if slots.len() > MAX_SCREENSHOTS {
            return Err(ReadError::TooManyScreenshots {
                given: slots.len(),
                max: MAX_SCREENSHOTS,
            });
        }

        let mut entries = Vec::new();

        for (slot, bytes) in slots.iter().enumerate() {
            let Some(bytes) = bytes else {
                continue;
            };
            let index = slot + 1;
            log(&format!("Reading screenshot #{}", index));

            match self.read_scoreboard(bytes) {
                Ok(mut read) => entries.append(&mut read),
                Err(e) => {
                    log(&format!("Screenshot #{} rejected: {}", index, e));
                    return Err(ReadError::MessyScreenshot {
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::{DynamicImage, GrayImage, ImageBuffer, Rgb};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io::Cursor;

    /// Returns one canned page of text per call, in order.
    struct FakeRecognizer {
        pages: RefCell<VecDeque<Vec<String>>>,
    }

    impl FakeRecognizer {
        fn new(pages: &[&[&str]]) -> Self {
            Self {
                pages: RefCell::new(
                    pages
                        .iter()
                        .map(|page| page.iter().map(|s| s.to_string()).collect())
                        .collect(),
                ),
            }
        }
    }

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, img: &GrayImage) -> Result<Vec<String>, ReadError> {
            assert_eq!(img.dimensions(), (34, 30));
            self.pages
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ReadError::Recognition("no more pages".to_string()))
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(17, 15, |x, _| {
            if x % 4 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn preprocess_config() -> PreprocessConfig {
        PreprocessConfig {
            width: 34,
            height: 30,
            blur_sigma: 1.0,
            dilate_kernel: 2,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 18).unwrap()
    }

    #[test]
    fn test_read_scoreboard_end_to_end() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop", "Paladin"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        let recognizer = FakeRecognizer::new(&[&["Anna 275 Bishop 12,345", "", "Bob 280 Paladln -"]]);
        let reader = ScoreboardReader::new(recognizer, &config, parser);

        let entries = reader.read_scoreboard(&png_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Anna");
        assert_eq!(entries[0].score, 12345);
        assert_eq!(entries[1].class, "Paladin");
        assert_eq!(entries[1].score, 0);
    }

    #[test]
    fn test_read_scoreboard_bad_image() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        let reader = ScoreboardReader::new(FakeRecognizer::new(&[]), &config, parser);

        let result = reader.read_scoreboard(b"not an image");
        assert!(matches!(result, Err(ReadError::ImageDecode(_))));
    }

    #[test]
    fn test_read_scoreboards_concatenates_and_skips_empty_slots() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop", "Paladin"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        let recognizer = FakeRecognizer::new(&[
            &["Anna 275 Bishop 12,345"],
            &["Bob 280 Paladin 45,231", "Cat 281 Paladin 1,000"],
        ]);
        let reader = ScoreboardReader::new(recognizer, &config, parser);
        let png = png_bytes();

        let slots = [Some(png.as_slice()), None, Some(png.as_slice())];
        let entries = reader.read_scoreboards(&slots).unwrap();

        assert_eq!(
            entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            vec!["Anna", "Bob", "Cat"]
        );
    }

    #[test]
    fn test_read_scoreboards_reports_messy_slot() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop", "Paladin"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        let recognizer = FakeRecognizer::new(&[
            &["Anna 275 Bishop 12,345"],
            &["Bob 280 Paladin 45,231", "garbage line"],
        ]);
        let reader = ScoreboardReader::new(recognizer, &config, parser);
        let png = png_bytes();

        let slots = [Some(png.as_slice()), None, Some(png.as_slice())];
        let err = reader.read_scoreboards(&slots).unwrap_err();

        match err {
            ReadError::MessyScreenshot { index, source } => {
                assert_eq!(index, 3);
                assert!(matches!(
                    *source,
                    ReadError::CountMismatch { raw_lines: 2, parsed: 1 }
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_scoreboards_rejects_too_many_slots() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        // No pages: reaching the recognizer would fail with a different error
        let reader = ScoreboardReader::new(FakeRecognizer::new(&[]), &config, parser);
        let png = png_bytes();

        let slots = vec![Some(png.as_slice()); MAX_SCREENSHOTS + 1];
        let err = reader.read_scoreboards(&slots).unwrap_err();

        assert!(matches!(
            err,
            ReadError::TooManyScreenshots { given: 13, max: 12 }
        ));
    }

    #[test]
    fn test_read_scoreboards_accepts_full_batch_of_empty_slots() {
        let config = preprocess_config();
        let confusions = ConfusionTable::default();
        let vocab = CategoryVocabulary::new(["Bishop"]);
        let parser = LineParser::new(&confusions, &vocab, date()).unwrap();
        let reader = ScoreboardReader::new(FakeRecognizer::new(&[]), &config, parser);

        let slots: Vec<Option<&[u8]>> = vec![None; MAX_SCREENSHOTS];
        assert!(reader.read_scoreboards(&slots).unwrap().is_empty());
    }
}
