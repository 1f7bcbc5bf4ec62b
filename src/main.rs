use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use labreport::config::{self, Config};
use labreport::{Analyzer, DocumentKind, KnowledgeBase, Status, TextExtractor};
use tracing_subscriber::EnvFilter;

enum Command {
    Analyze { path: PathBuf },
    Symptoms { text: String },
}

struct Args {
    command: Command,
    json: bool,
}

fn usage(bin_name: &str) -> String {
    format!(
        "Usage:\n  {bin_name} analyze <report-file> [--json]\n  {bin_name} symptoms <description...> [--json]"
    )
}

fn parse_args() -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;

    let mut values = Vec::new();
    let mut json = false;
    let mut parser = lexopt::Parser::from_env();

    while let Some(arg) = parser.next()? {
        match arg {
            Value(val) => values.push(val.string()?),
            Long("json") => json = true,
            Short('h') | Long("help") => {
                println!("{}", usage(parser.bin_name().unwrap_or(config::APP_NAME)));
                std::process::exit(0);
            }
            _ => return Err(arg.unexpected()),
        }
    }

    let mut values = values.into_iter();
    let command = match values.next().as_deref() {
        Some("analyze") => {
            let path = values.next().ok_or("missing report file path")?;
            Command::Analyze { path: PathBuf::from(path) }
        }
        Some("symptoms") => {
            let text = values.collect::<Vec<_>>().join(" ");
            if text.trim().is_empty() {
                return Err("missing symptom description".into());
            }
            Command::Symptoms { text }
        }
        Some(other) => return Err(format!("unknown command '{other}'").into()),
        None => return Err("missing command, try --help".into()),
    };

    Ok(Args { command, json })
}

/// OCR is only needed for images and scanned PDFs; run without it when the
/// models are missing.
fn load_extractor(config: &Config, path: &Path) -> Result<TextExtractor> {
    let kind = DocumentKind::from_filename(&path.to_string_lossy())?;
    if !matches!(kind, DocumentKind::Image | DocumentKind::Pdf) {
        return Ok(TextExtractor::without_ocr());
    }
    match labreport::models::load_ocr_engine(&config.detection_model, &config.recognition_model) {
        Ok(engine) => Ok(TextExtractor::new(Some(engine))),
        Err(e) => {
            tracing::warn!(error = %e, "OCR models unavailable, continuing without OCR");
            Ok(TextExtractor::without_ocr())
        }
    }
}

fn analyze(analyzer: &Analyzer, config: &Config, path: &Path, json: bool) -> Result<()> {
    let kind = DocumentKind::from_filename(&path.to_string_lossy())
        .with_context(|| format!("Cannot analyze {}", path.display()))?;
    let extractor = load_extractor(config, path)?;
    let text = extractor.extract(path, kind);
    let analysis = analyzer.analyze(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    if analysis.is_empty() {
        println!("No known parameters found in {}", path.display());
    }
    for reading in &analysis.readings {
        let flag = match reading.status {
            Status::Normal => "  ",
            Status::Abnormal => "!!",
        };
        println!(
            "{flag} {:<14} {:>10} {:<18} {}",
            reading.parameter, reading.value, reading.unit, reading.explanation
        );
    }
    println!();
    println!("{}", analysis.recommendation);
    Ok(())
}

fn symptoms(analyzer: &Analyzer, text: &str, json: bool) -> Result<()> {
    let tests = analyzer.recommend_tests(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&tests)?);
    } else if tests.is_empty() {
        println!("No tests matched the description.");
    } else {
        for test in tests {
            println!("{test}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = Config::from_env();

    let kb = KnowledgeBase::load(
        config.ranges_path.as_deref(),
        config.specialties_path.as_deref(),
        config.symptoms_path.as_deref(),
    )
    .context("Failed to load reference tables")?;
    let analyzer = Analyzer::new(kb).context("Failed to build parameter patterns")?;

    match args.command {
        Command::Analyze { path } => analyze(&analyzer, &config, &path, args.json),
        Command::Symptoms { text } => symptoms(&analyzer, &text, args.json),
    }
}
