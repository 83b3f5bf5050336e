//! Culvert OCR command line.
//!
//! Reads culvert scoreboard screenshots, links every row to the guild
//! roster and prints (or exports) the result.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use culvert_ocr::input::{capture_date, ImageSource};
use culvert_ocr::linker::{check_duplicate_entries, link_entries};
use culvert_ocr::ocr::{
    CategoryVocabulary, LineParser, ParsedEntry, ScoreboardReader, Tesseract, MAX_SCREENSHOTS,
};
use culvert_ocr::roster::load_roster;
use culvert_ocr::{log, paths, report, PipelineConfig};

#[derive(Parser)]
#[command(name = "culvert-ocr", version, about = "Read culvert scoreboard screenshots")]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse screenshots and print the rows that were read
    Read {
        #[command(flatten)]
        screenshots: Screenshots,
    },
    /// Parse screenshots and link every row to a roster member
    Link {
        #[command(flatten)]
        screenshots: Screenshots,
        /// Roster CSV (overrides the config)
        #[arg(long)]
        roster: Option<PathBuf>,
        /// Append linked rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write linked rows to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write a config.json with default values
    InitConfig {
        /// Output path
        #[arg(default_value = "config.json")]
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct Screenshots {
    /// Screenshot paths or URLs, in page order; `-` leaves a slot empty
    #[arg(required = true, num_args = 1..=MAX_SCREENSHOTS)]
    images: Vec<String>,
    /// Class list CSV (overrides the config)
    #[arg(long)]
    classes: Option<PathBuf>,
    /// Date to stamp on the scores (YYYY-MM-DD), defaults to today (UTC)
    #[arg(long)]
    date: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    paths::ensure_directories()?;

    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);
    let config = PipelineConfig::load(&config_path);

    match cli.command {
        Command::Read { screenshots } => {
            let entries = read_screenshots(&config, &screenshots)?;
            for (index, entry) in entries.iter().enumerate() {
                println!(
                    "{:>3}  {:<16} {:<20} {:>3} {:>10}",
                    index + 1,
                    entry.name,
                    entry.class,
                    entry.level,
                    entry.score
                );
            }
            Ok(())
        }
        Command::Link {
            screenshots,
            roster,
            csv,
            json,
        } => {
            let roster_path = roster.unwrap_or_else(|| config.roster_csv.clone());
            let roster = load_roster(&roster_path)?;
            let entries = read_screenshots(&config, &screenshots)?;

            check_duplicate_entries(&entries)?;
            let mut records = link_entries(&roster, &entries)?;
            report::rank_by_score(&mut records);

            for (place, record) in records.iter().enumerate() {
                println!(
                    "{:>3}  {:<16} <- {:<16} {:<20} {:>10}  ({:.2})",
                    place + 1,
                    record.canonical_name,
                    record.entry.name,
                    record.entry.class,
                    record.entry.score,
                    record.similarity
                );
            }

            let missing = report::zero_score_members(&records);
            if !missing.is_empty() {
                println!("\nNo score recorded:");
                for record in missing {
                    match &record.external_id {
                        Some(id) => println!("  {} (<@{}>)", record.canonical_name, id),
                        None => println!("  {}", record.canonical_name),
                    }
                }
            }

            if let Some(path) = csv {
                report::append_to_csv(&path, &records)?;
                log(&format!("Appended {} rows to {}", records.len(), path.display()));
            }
            if let Some(path) = json {
                report::export_to_json(&records, &path)?;
                log(&format!("Linked records saved: {}", path.display()));
            }
            Ok(())
        }
        Command::InitConfig { path } => {
            PipelineConfig::save_default(&path)
                .context(format!("Failed to write {}", path.display()))?;
            println!("Default config written to {}", path.display());
            Ok(())
        }
    }
}

/// Loads the given screenshots and runs them through the reader.
fn read_screenshots(config: &PipelineConfig, args: &Screenshots) -> Result<Vec<ParsedEntry>> {
    let classes_path = args.classes.clone().unwrap_or_else(|| config.classes_csv.clone());
    let classes = CategoryVocabulary::from_csv(&classes_path)?;
    log(&format!("Loaded {} classes", classes.len()));

    let date = capture_date(args.date.as_deref())?;

    let mut images: Vec<Option<Vec<u8>>> = Vec::with_capacity(args.images.len());
    for arg in &args.images {
        if arg == "-" {
            images.push(None);
        } else {
            images.push(Some(ImageSource::parse(arg).load()?));
        }
    }
    if images.iter().all(Option::is_none) {
        return Err(anyhow!("No screenshots given"));
    }

    let recognizer = Tesseract::from_config(&config.tesseract)?;
    let parser = LineParser::new(&config.ocr_confusions, &classes, date)?;
    let reader = ScoreboardReader::new(recognizer, &config.preprocess, parser);

    let slots: Vec<Option<&[u8]>> = images.iter().map(|image| image.as_deref()).collect();
    Ok(reader.read_scoreboards(&slots)?)
}
