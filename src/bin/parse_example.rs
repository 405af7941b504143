use kml_rs::core::extractor::summarize;
use kml_rs::core::parser::{KmlParser, Parser};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "kml_rs=warn".into()),
        )
        .init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"));
    if !data_dir.exists() {
        println!("No {} directory found. Pass a directory or place .kml files in ./data.", data_dir.display());
        return Ok(());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&data_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "kml") {
            files.push(path);
        }
    }
    files.sort();

    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, summarize_file(path)))
        .collect();

    for (path, result) in results {
        println!("Parsing {}", path.display());
        match result {
            Ok(report) => {
                for (kind, count) in &report.summary {
                    println!("  {kind}: {count}");
                }
                for detail in report.details.iter().take(5) {
                    println!("  [{}] {} coordinate tokens", detail.kind, detail.total_length);
                }
            }
            Err(e) => println!("  error: {e:#}"),
        }
    }

    Ok(())
}

fn summarize_file(path: &Path) -> anyhow::Result<kml_rs::ExtractionReport> {
    let root = KmlParser::new().parse(path)?;
    Ok(summarize(&root)?)
}
