//! Command-line interface for dca
//!
//! Provides argument parsing using clap derive macros.

use crate::pipeline::Direction;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Transcode between PCM16 audio and DCA (length-framed Opus)
#[derive(Parser, Debug)]
#[command(
    name = "dca",
    version,
    about = "Transcode between PCM16 audio and DCA (length-framed Opus)"
)]
pub struct Cli {
    /// Transcoding direction
    #[arg(long, value_enum, default_value_t = Mode::Encode)]
    pub mode: Mode,

    /// Input file, or pipe:0 for stdin
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<String>,

    /// Input file (same as -i)
    #[arg(value_name = "INPUT", conflicts_with = "input")]
    pub positional_input: Option<String>,

    /// Volume scale passed to ffmpeg (256 = normal)
    #[arg(long = "vol", value_name = "N")]
    pub volume: Option<i32>,

    /// Audio channels
    #[arg(long = "ac", value_name = "N")]
    pub channels: Option<u16>,

    /// Sample rate in Hz
    #[arg(long = "ar", value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Frame size in samples per channel
    #[arg(long = "as", value_name = "SAMPLES")]
    pub frame_size: Option<usize>,

    /// Bitrate in kb/s (1-512)
    #[arg(long = "ab", value_name = "KBPS", allow_negative_numbers = true)]
    pub bitrate: Option<i32>,

    /// Write bare frames without the DCA1 header
    #[arg(long)]
    pub raw: bool,

    /// Opus application profile (audio, voip, lowdelay)
    #[arg(long = "aa", value_name = "PROFILE")]
    pub application: Option<String>,

    /// Cover art format (jpeg, png)
    #[arg(long = "cf", value_name = "FORMAT")]
    pub cover_format: Option<String>,

    /// Keep the process alive after the run finishes
    #[arg(short, long)]
    pub wait: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress warnings (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Encode,
    Decode,
}

impl From<Mode> for Direction {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Encode => Direction::Encode,
            Mode::Decode => Direction::Decode,
        }
    }
}

/// Long flags older callers pass with a single dash (`-ac 2 -raw`).
const LEGACY_LONG_FLAGS: [&str; 10] = [
    "mode", "vol", "ac", "ar", "as", "ab", "aa", "cf", "raw", "wait",
];

/// Rewrites single-dash long flags such as `-ar 48000` to `--ar 48000`.
///
/// Values, short flags and anything after `--` are left alone.
pub fn normalize_legacy_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            if passthrough {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }
            match arg.strip_prefix('-') {
                Some(name) if !name.starts_with('-') && LEGACY_LONG_FLAGS.contains(&name) => {
                    format!("-{}", arg)
                }
                _ => arg,
            }
        })
        .collect()
}

impl Cli {
    /// Input argument after merging `-i` and the positional form.
    pub fn input_arg(&self) -> Option<&str> {
        self.input
            .as_deref()
            .or(self.positional_input.as_deref())
    }
}
