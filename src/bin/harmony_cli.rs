//! Demo CLI: harmonize a score-exchange XML file from the command line
//! (SPEC_FULL.md §6.3).

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use harmony_engine::{harmonize, Cache, Output};

#[derive(Parser)]
#[command(name = "harmony-cli", about = "Four-part harmonize a partwise score-exchange XML melody")]
struct Args {
    /// Path to the input XML file.
    input: PathBuf,

    /// Instrument names to harmonize for, in order (max 4).
    #[arg(short, long = "instrument", value_name = "NAME")]
    instruments: Vec<String>,

    /// Write the harmony-only document to this path instead of stdout.
    #[arg(long)]
    harmony_out: Option<PathBuf>,

    /// Write the combined document to this path.
    #[arg(long)]
    combined_out: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let bytes = match fs::read(&args.input) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.input.display());
            std::process::exit(1);
        }
    };

    let instruments = if args.instruments.is_empty() {
        vec!["Violin".to_string()]
    } else {
        args.instruments
    };

    let cache: Cache<Output> = Cache::new(100, 30);
    let filename = args.input.file_name().and_then(|s| s.to_str());

    match harmonize(&bytes, &instruments, filename, &cache) {
        Ok(result) => {
            emit(&result.harmony_only.content, args.harmony_out.as_deref());
            emit(&result.combined.content, args.combined_out.as_deref());
            for warning in &result.warnings {
                eprintln!("warning: {warning}");
            }
            eprintln!(
                "quality: {:.1} (refined: {}), {}ms -- {} / {}",
                result.quality.overall,
                result.metadata.refined,
                result.metadata.processing_time_ms,
                result.harmony_only.filename,
                result.combined.filename
            );
        }
        Err(e) => {
            eprintln!("harmonization failed: {e}");
            std::process::exit(1);
        }
    }
}

fn emit(xml: &str, path: Option<&std::path::Path>) {
    match path {
        Some(path) => {
            if let Err(e) = fs::write(path, xml) {
                eprintln!("failed to write {}: {e}", path.display());
            }
        }
        None => println!("{xml}"),
    }
}
