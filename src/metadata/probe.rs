//! Source file inspection through `ffprobe`.

use crate::error::{DcaError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

/// Format information extracted from probe output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeInfo {
    /// Container bitrate in bits/s, 0 when ffprobe does not report one.
    pub bitrate: u64,
    pub format_long_name: String,
    /// `None` when the file carries no tags at all.
    pub tags: Option<ProbeTags>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProbeTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
}

#[derive(Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(Deserialize)]
struct ProbeFormat {
    bit_rate: Option<String>,
    #[serde(default)]
    format_long_name: String,
    tags: Option<HashMap<String, String>>,
}

/// Runs `ffprobe` on `path` and parses its format section.
pub fn probe_file(path: &Path) -> Result<ProbeInfo> {
    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .map_err(|e| DcaError::Probe {
            path: path.display().to_string(),
            message: format!("failed to run ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(DcaError::Probe {
            path: path.display().to_string(),
            message: format!("ffprobe exited with {}", output.status),
        });
    }

    parse_probe_output(&output.stdout).map_err(|e| DcaError::Probe {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Parses `ffprobe -show_format` JSON.
///
/// Tag keys are matched case-insensitively since containers disagree on case.
pub fn parse_probe_output(json: &[u8]) -> Result<ProbeInfo> {
    let output: ProbeOutput = serde_json::from_slice(json)?;
    let format = output.format;

    let bitrate = match format.bit_rate.as_deref().map(str::trim) {
        None | Some("") | Some("N/A") => 0,
        Some(raw) => raw.parse().map_err(|_| DcaError::Other(format!(
            "could not convert bitrate {:?} to an integer",
            raw
        )))?,
    };

    let tags = format.tags.map(|raw| {
        let tags: HashMap<String, String> = raw
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();
        let tag = |name: &str| tags.get(name).cloned().unwrap_or_default();
        ProbeTags {
            title: tag("title"),
            artist: tag("artist"),
            album: tag("album"),
            genre: tag("genre"),
        }
    });

    Ok(ProbeInfo {
        bitrate,
        format_long_name: format.format_long_name,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_format_section() {
        let json = br#"{
            "format": {
                "filename": "song.mp3",
                "format_name": "mp3",
                "format_long_name": "MP2/3 (MPEG audio layer 2/3)",
                "bit_rate": "320000",
                "tags": {
                    "title": "Song",
                    "artist": "Band",
                    "album": "Record",
                    "genre": "Rock"
                }
            }
        }"#;

        let info = parse_probe_output(json).unwrap();

        assert_eq!(info.bitrate, 320_000);
        assert_eq!(info.format_long_name, "MP2/3 (MPEG audio layer 2/3)");
        let tags = info.tags.unwrap();
        assert_eq!(tags.title, "Song");
        assert_eq!(tags.album, "Record");
    }

    #[test]
    fn tag_keys_are_case_insensitive() {
        let json = br#"{"format": {"bit_rate": "900000", "tags": {"TITLE": "Loud", "Artist": "Mixed"}}}"#;

        let tags = parse_probe_output(json).unwrap().tags.unwrap();

        assert_eq!(tags.title, "Loud");
        assert_eq!(tags.artist, "Mixed");
        assert_eq!(tags.genre, "");
    }

    #[test]
    fn missing_tags_and_bitrate() {
        let json = br#"{"format": {"format_long_name": "raw PCM"}}"#;

        let info = parse_probe_output(json).unwrap();

        assert_eq!(info.bitrate, 0);
        assert!(info.tags.is_none());
    }

    #[test]
    fn non_numeric_bitrate_is_error() {
        let json = br#"{"format": {"bit_rate": "fast"}}"#;
        let err = parse_probe_output(json).unwrap_err();
        assert!(err.to_string().contains("could not convert bitrate"));
    }

    #[test]
    fn invalid_json_is_error() {
        assert!(matches!(
            parse_probe_output(b"not json"),
            Err(DcaError::Metadata(_))
        ));
    }
}
