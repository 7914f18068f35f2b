//! Cover art extraction for the metadata block.

use crate::error::{DcaError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use std::process::{Command, Stdio};

/// Image format the cover is embedded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverFormat {
    #[default]
    Jpeg,
    Png,
}

impl CoverFormat {
    /// Anything other than "png" keeps the extracted JPEG as is.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("png") {
            CoverFormat::Png
        } else {
            CoverFormat::Jpeg
        }
    }
}

/// Extracts the embedded picture of `path` as base64, if there is one.
///
/// Files without artwork are common, so every failure just yields `None`.
pub fn extract_cover(path: &Path, format: CoverFormat) -> Option<String> {
    let jpeg = match extract_jpeg(path) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            tracing::debug!(path = %path.display(), "no cover art: {}", e);
            return None;
        }
    };

    match encode_cover(&jpeg, format) {
        Ok(cover) => Some(cover),
        Err(e) => {
            tracing::debug!(path = %path.display(), "dropping cover art: {}", e);
            None
        }
    }
}

fn extract_jpeg(path: &Path) -> Result<Vec<u8>> {
    let output = Command::new("ffmpeg")
        .args(["-loglevel", "0", "-i"])
        .arg(path)
        .args(["-an", "-frames:v", "1", "-c:v", "mjpeg", "-f", "mjpeg", "pipe:1"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| DcaError::Cover {
            message: format!("failed to run ffmpeg: {}", e),
        })?;

    if !output.status.success() {
        return Err(DcaError::Cover {
            message: format!("ffmpeg exited with {}", output.status),
        });
    }
    if output.stdout.is_empty() {
        return Err(DcaError::Cover {
            message: "no picture stream".to_string(),
        });
    }
    Ok(output.stdout)
}

/// Base64-encodes a JPEG cover, re-encoding it first when PNG is requested.
pub fn encode_cover(jpeg: &[u8], format: CoverFormat) -> Result<String> {
    match format {
        CoverFormat::Jpeg => Ok(STANDARD.encode(jpeg)),
        CoverFormat::Png => {
            let img = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg).map_err(
                |e| DcaError::Cover {
                    message: format!("invalid JPEG: {}", e),
                },
            )?;
            let mut png = Vec::new();
            img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|e| DcaError::Cover {
                    message: format!("PNG encoding failed: {}", e),
                })?;
            Ok(STANDARD.encode(png))
        }
    }
}
