use clap::Subcommand;
use std::path::PathBuf;

pub mod codecs;
pub mod convert;
mod execute;
pub mod info;
pub mod inspect;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the chunk tree of a RIFF/RIFX file
    Inspect {
        /// File to inspect
        file: PathBuf,

        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,

        /// Reject chunks that have no registered definition
        #[arg(long)]
        strict: bool,
    },

    /// Show the audio format of a WAVE file
    Info {
        /// WAVE file
        file: PathBuf,

        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encode a WAVE file with a different sample layout
    Convert {
        /// Source file or file: URI
        source: String,

        /// Destination .wav file
        destination: PathBuf,

        /// Bits per sample of the output
        #[arg(long, value_parser = ["8", "16", "24", "32", "64"])]
        bits: String,

        /// Write IEEE float samples (32 or 64 bits)
        #[arg(long)]
        float: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the sample codec table
    Codecs {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
}
