use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use formfill::FormRenderer;

/// Generate a populated form image from a preset and a patient data file.
#[derive(Parser, Debug)]
#[command(name = "formfill", version)]
struct Cli {
    /// Path to the preset JSON file.
    #[arg(long, short = 'p')]
    preset: PathBuf,

    /// Path to the patient data JSON file.
    #[arg(long, short = 'd')]
    data: PathBuf,

    /// Output image path (.png keeps alpha, .jpg flattens).
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Write only the transparent overlay, without the form background.
    #[arg(long)]
    overlay_only: bool,

    /// Raise log verbosity to debug.
    #[arg(long, short = 'v')]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let f = File::open(&cli.data)
        .with_context(|| format!("open patient data '{}'", cli.data.display()))?;
    let data: serde_json::Value =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse patient data JSON")?;

    let renderer = FormRenderer::open(&cli.preset)?;

    if cli.overlay_only {
        renderer.render_overlay_only(&data, &cli.output)?;
    } else {
        renderer.render(&data, &cli.output)?;
    }

    println!("Generated: {}", cli.output.display());
    Ok(())
}
