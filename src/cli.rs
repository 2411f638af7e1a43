use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rzip")]
#[command(version)]
#[command(about = "A Rust zip utility that bundles files into a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  rzip bundle.zip a.txt b.jpg        archive two files into bundle.zip\n  \
  rzip -0 raw.zip huge.mp4           store without compression\n  \
  rzip -q backup.zip *.log           archive quietly, no progress bar")]
pub struct Cli {
    /// Output ZIP file path
    #[arg(value_name = "ARCHIVE")]
    pub output: PathBuf,

    /// Files to add to the archive, in order
    #[arg(value_name = "FILES", required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Compression level (0 = store, 9 = best)
    #[arg(short = 'c', long = "level", value_name = "N", default_value_t = 6)]
    pub level: u32,

    /// Store without compression (same as --level 0)
    #[arg(short = '0', conflicts_with = "level")]
    pub store: bool,

    /// Keep a partially written archive when the run fails
    #[arg(long)]
    pub keep_partial: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn compression_level(&self) -> u32 {
        if self.store { 0 } else { self.level.min(9) }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }
}
