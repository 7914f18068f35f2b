//! Input resolution: stdin or a file, optionally converted through `ffmpeg`.

use crate::config::RunConfig;
use crate::defaults;
use crate::error::{DcaError, Result};
use std::fs::File;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Where the input bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// Interprets a command-line input argument. `pipe:0` means stdin.
    pub fn from_arg(arg: &str) -> Self {
        if arg == defaults::STDIN_INPUT {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Stdin => None,
            Self::File(path) => Some(path),
        }
    }

    /// Rejects a missing file, or stdin attached to a terminal.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Stdin => {
                if std::io::stdin().is_terminal() {
                    return Err(DcaError::Input {
                        message: "stdin is a terminal; pipe PCM data in or pass a file".to_string(),
                    });
                }
                Ok(())
            }
            Self::File(path) => {
                if !path.exists() {
                    return Err(DcaError::Input {
                        message: format!("{} does not exist", path.display()),
                    });
                }
                Ok(())
            }
        }
    }
}

/// PCM16 input for an encode run.
pub struct PcmInput {
    pub reader: Box<dyn Read + Send>,
    pub converter: Converter,
}

/// The `ffmpeg` child converting a file input, if any.
#[derive(Debug, Default)]
pub struct Converter {
    child: Option<Child>,
}

impl Converter {
    /// Reaps the converter process.
    ///
    /// A non-zero exit is logged rather than returned; the pipeline has
    /// already consumed whatever the converter produced.
    pub fn wait(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            if !status.success() {
                tracing::warn!(%status, "ffmpeg exited unsuccessfully");
            }
        }
        Ok(())
    }
}

/// `ffmpeg` argument list that converts `path` to headerless PCM16 on stdout.
pub fn ffmpeg_args(path: &Path, config: &RunConfig) -> Vec<String> {
    vec![
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        path.display().to_string(),
        "-vol".to_string(),
        config.volume.to_string(),
        "-f".to_string(),
        "s16le".to_string(),
        "-ar".to_string(),
        config.codec.sample_rate.to_string(),
        "-ac".to_string(),
        config.codec.channels.to_string(),
        "pipe:1".to_string(),
    ]
}

/// Opens the PCM stream for encoding.
///
/// Stdin is read as-is; a file is piped through `ffmpeg` at the run's sample
/// rate, channel count and volume.
pub fn open_encode_input(source: &InputSource, config: &RunConfig) -> Result<PcmInput> {
    match source {
        InputSource::Stdin => Ok(PcmInput {
            reader: Box::new(std::io::stdin()),
            converter: Converter::default(),
        }),
        InputSource::File(path) => {
            let args = ffmpeg_args(path, config);
            tracing::debug!(?args, "spawning ffmpeg");
            let mut child = Command::new("ffmpeg")
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .spawn()
                .map_err(|e| DcaError::ToolSpawn {
                    tool: "ffmpeg".to_string(),
                    message: e.to_string(),
                })?;
            let stdout = child.stdout.take().ok_or_else(|| DcaError::ToolSpawn {
                tool: "ffmpeg".to_string(),
                message: "stdout was not captured".to_string(),
            })?;
            Ok(PcmInput {
                reader: Box::new(stdout),
                converter: Converter { child: Some(child) },
            })
        }
    }
}

/// Opens the raw DCA stream for decoding.
pub fn open_decode_input(source: &InputSource) -> Result<Box<dyn Read + Send>> {
    match source {
        InputSource::Stdin => Ok(Box::new(std::io::stdin())),
        InputSource::File(path) => Ok(Box::new(File::open(path)?)),
    }
}
