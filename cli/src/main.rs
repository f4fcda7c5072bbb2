use anyhow::Context;
use clap::Parser;
use fatscan_core::Report;
use fatscan_fat::{Checker, FatImage};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fatscan")]
#[command(about = "Check and repair FAT12/FAT16 filesystem images", long_about = None)]
struct Cli {
    /// Path to the filesystem image
    image: PathBuf,

    /// Scan and report without writing repairs back to the image
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,

    /// Show the directory listing and per-cluster detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let image = FatImage::open(&cli.image)
        .with_context(|| format!("failed to open image {}", cli.image.display()))?;
    let mut checker = Checker::new(image)
        .with_context(|| format!("{} is not a usable FAT12/FAT16 image", cli.image.display()))?;
    let report = checker.run();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_report(&report, checker.volume_label()));
    }

    if cli.dry_run {
        if checker.has_repairs() {
            eprintln!("Dry run: repairs were not written back.");
        }
    } else {
        checker
            .flush()
            .with_context(|| format!("failed to write repairs back to {}", cli.image.display()))?;
    }

    Ok(())
}

/// Human-readable report: volume label, one line per finding, summary.
fn render_report(report: &Report, volume_label: Option<&str>) -> String {
    let mut out = String::new();
    if let Some(label) = volume_label {
        out.push_str(&format!("Volume: {label}\n"));
    }
    for finding in &report.findings {
        out.push_str(&format!("{finding}\n"));
    }
    out.push_str(&report.summary().to_string());
    out
}
