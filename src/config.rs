use crate::codec::Application;
use crate::defaults;
use crate::error::{DcaError, Result};
use crate::metadata::cover::CoverFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Root configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub opus: OpusConfig,
    pub output: OutputConfig,
}

/// Opus codec settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpusConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_size: usize,
    /// Bitrate in kb/s
    pub bitrate: i32,
    pub application: String,
    /// ffmpeg volume scale (256 = normal)
    pub volume: i32,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub raw: bool,
    pub cover_format: String,
    pub queue_depth: usize,
}

impl Default for OpusConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            frame_size: defaults::FRAME_SIZE,
            bitrate: defaults::BITRATE_KBPS,
            application: defaults::APPLICATION.to_string(),
            volume: defaults::VOLUME,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw: false,
            cover_format: defaults::COVER_FORMAT.to_string(),
            queue_depth: defaults::QUEUE_DEPTH,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file doesn't exist
    ///
    /// Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(DcaError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - DCA_BITRATE → opus.bitrate (kb/s)
    /// - DCA_APPLICATION → opus.application
    /// - DCA_COVER_FORMAT → output.cover_format
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(bitrate) = std::env::var("DCA_BITRATE")
            && !bitrate.is_empty()
        {
            self.opus.bitrate =
                bitrate
                    .trim()
                    .parse()
                    .map_err(|e| DcaError::ConfigInvalidValue {
                        key: "DCA_BITRATE".to_string(),
                        message: format!("{}", e),
                    })?;
        }

        if let Ok(application) = std::env::var("DCA_APPLICATION")
            && !application.is_empty()
        {
            self.opus.application = application;
        }

        if let Ok(format) = std::env::var("DCA_COVER_FORMAT")
            && !format.is_empty()
        {
            self.output.cover_format = format;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/dca/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dca").join("config.toml"))
    }
}

/// Frame sizes (samples per channel) Opus can encode at `sample_rate`.
pub fn legal_frame_sizes(sample_rate: u32) -> Vec<usize> {
    let per_2_5ms = (sample_rate / 400) as usize;
    defaults::FRAME_DURATION_MULTIPLES
        .iter()
        .filter_map(|&multiple| per_2_5ms.checked_mul(multiple))
        .collect()
}

fn validate_frame_size(sample_rate: u32, channels: u16, frame_size: usize) -> Result<()> {
    let invalid = |message: String| DcaError::ConfigInvalidValue {
        key: "frame_size".to_string(),
        message,
    };

    // A whole PCM16 frame must be addressable as a byte buffer.
    frame_size
        .checked_mul(usize::from(channels))
        .and_then(|samples| samples.checked_mul(2))
        .ok_or_else(|| invalid(format!("{} samples per channel overflows a frame buffer", frame_size)))?;

    let legal = legal_frame_sizes(sample_rate);
    if !legal.contains(&frame_size) {
        let sizes: Vec<String> = legal.iter().map(ToString::to_string).collect();
        return Err(invalid(format!(
            "{} is not an Opus frame duration at {} Hz, use one of {}",
            frame_size,
            sample_rate,
            sizes.join(", ")
        )));
    }
    Ok(())
}

/// Clamps a kb/s bitrate to the meaningful range, falling back to the default.
pub fn clamp_bitrate_kbps(kbps: i32) -> i32 {
    if (defaults::MIN_BITRATE_KBPS..=defaults::MAX_BITRATE_KBPS).contains(&kbps) {
        kbps
    } else {
        defaults::BITRATE_KBPS
    }
}

/// Validated codec parameters shared by the encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per channel in one frame.
    pub frame_size: usize,
    /// Bits per second.
    pub bitrate: i32,
    pub application: Application,
}

impl CodecConfig {
    /// Builds codec parameters, clamping the kb/s bitrate.
    pub fn new(
        sample_rate: u32,
        channels: u16,
        frame_size: usize,
        bitrate_kbps: i32,
        application: Application,
    ) -> Result<Self> {
        if !defaults::SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(DcaError::ConfigInvalidValue {
                key: "sample_rate".to_string(),
                message: format!(
                    "must be one of 8000, 12000, 16000, 24000, 48000, got {}",
                    sample_rate
                ),
            });
        }
        if channels != 1 && channels != 2 {
            return Err(DcaError::ConfigInvalidValue {
                key: "channels".to_string(),
                message: format!("must be 1 or 2, got {}", channels),
            });
        }
        validate_frame_size(sample_rate, channels, frame_size)?;

        let clamped = clamp_bitrate_kbps(bitrate_kbps);
        if clamped != bitrate_kbps {
            tracing::info!(
                requested = bitrate_kbps,
                used = clamped,
                "bitrate out of range, using default"
            );
        }

        Ok(Self {
            sample_rate,
            channels,
            frame_size,
            bitrate: clamped * 1000,
            application,
        })
    }

    /// Interleaved samples in one frame.
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * usize::from(self.channels)
    }

    /// Size of one PCM frame in bytes, also the encoder's packet bound.
    pub fn max_packet_bytes(&self) -> usize {
        self.samples_per_frame() * 2
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            frame_size: defaults::FRAME_SIZE,
            bitrate: defaults::BITRATE_KBPS * 1000,
            application: Application::Audio,
        }
    }
}

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub codec: CodecConfig,
    /// Omit magic bytes and metadata from encode output.
    pub raw: bool,
    pub queue_depth: usize,
    pub cover_format: CoverFormat,
    pub volume: i32,
}

impl RunConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let codec = CodecConfig::new(
            config.opus.sample_rate,
            config.opus.channels,
            config.opus.frame_size,
            config.opus.bitrate,
            Application::from_name(&config.opus.application),
        )?;

        if config.output.queue_depth == 0 {
            return Err(DcaError::ConfigInvalidValue {
                key: "queue_depth".to_string(),
                message: "must be positive".to_string(),
            });
        }

        Ok(Self {
            codec,
            raw: config.output.raw,
            queue_depth: config.output.queue_depth,
            cover_format: CoverFormat::from_name(&config.output.cover_format),
            volume: config.opus.volume,
        })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            codec: CodecConfig::default(),
            raw: false,
            queue_depth: defaults::QUEUE_DEPTH,
            cover_format: CoverFormat::Jpeg,
            volume: defaults::VOLUME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENV_LOCK;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_dca_env() {
        remove_env("DCA_BITRATE");
        remove_env("DCA_APPLICATION");
        remove_env("DCA_COVER_FORMAT");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.opus.sample_rate, 48000);
        assert_eq!(config.opus.channels, 2);
        assert_eq!(config.opus.frame_size, 960);
        assert_eq!(config.opus.bitrate, 64);
        assert_eq!(config.opus.application, "audio");
        assert_eq!(config.opus.volume, 256);

        assert!(!config.output.raw);
        assert_eq!(config.output.cover_format, "jpeg");
        assert_eq!(config.output.queue_depth, 10);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [opus]
            sample_rate = 24000
            channels = 1
            bitrate = 96
            application = "voip"

            [output]
            raw = true
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.opus.sample_rate, 24000);
        assert_eq!(config.opus.channels, 1);
        assert_eq!(config.opus.bitrate, 96);
        assert_eq!(config.opus.application, "voip");
        // Unspecified fields keep their defaults
        assert_eq!(config.opus.frame_size, 960);
        assert!(config.output.raw);
        assert_eq!(config.output.queue_depth, 10);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_invalid_toml_is_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[opus\nbitrate = ").unwrap();

        let result = Config::load_or_default(temp_file.path());
        assert!(matches!(result, Err(DcaError::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_dca_env();
        set_env("DCA_BITRATE", "128");
        set_env("DCA_APPLICATION", "lowdelay");
        set_env("DCA_COVER_FORMAT", "png");

        let config = Config::default().with_env_overrides().unwrap();
        clear_dca_env();

        assert_eq!(config.opus.bitrate, 128);
        assert_eq!(config.opus.application, "lowdelay");
        assert_eq!(config.output.cover_format, "png");
    }

    #[test]
    fn test_env_override_bad_bitrate_is_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_dca_env();
        set_env("DCA_BITRATE", "fast");

        let result = Config::default().with_env_overrides();
        clear_dca_env();

        assert!(matches!(result, Err(DcaError::ConfigInvalidValue { .. })));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_dca_env();
        set_env("DCA_APPLICATION", "");

        let config = Config::default().with_env_overrides().unwrap();
        clear_dca_env();

        assert_eq!(config.opus.application, "audio");
    }

    #[test]
    fn bitrate_out_of_range_falls_back_to_default() {
        for kbps in [0, 513, -5] {
            let codec = CodecConfig::new(48000, 2, 960, kbps, Application::Audio).unwrap();
            assert_eq!(codec.bitrate, 64_000, "input {} kb/s", kbps);
        }
    }

    #[test]
    fn bitrate_range_edges_are_kept() {
        let low = CodecConfig::new(48000, 2, 960, 1, Application::Audio).unwrap();
        let high = CodecConfig::new(48000, 2, 960, 512, Application::Audio).unwrap();
        assert_eq!(low.bitrate, 1_000);
        assert_eq!(high.bitrate, 512_000);
    }

    #[test]
    fn unsupported_sample_rate_is_rejected() {
        let err = CodecConfig::new(44100, 2, 960, 64, Application::Audio).unwrap_err();
        assert!(err.to_string().contains("sample_rate"));
    }

    #[test]
    fn unsupported_channel_count_is_rejected() {
        let err = CodecConfig::new(48000, 6, 960, 64, Application::Audio).unwrap_err();
        assert!(err.to_string().contains("channels"));
    }

    #[test]
    fn frame_size_must_be_an_opus_duration() {
        let err = CodecConfig::new(48000, 2, 1000, 64, Application::Audio).unwrap_err();
        assert!(matches!(err, DcaError::ConfigInvalidValue { ref key, .. } if key == "frame_size"));
        assert!(err.to_string().contains("120, 240, 480, 960, 1920, 2880"));
    }

    #[test]
    fn zero_frame_size_is_rejected() {
        assert!(CodecConfig::new(48000, 2, 0, 64, Application::Audio).is_err());
    }

    #[test]
    fn overflowing_frame_size_is_rejected() {
        let err = CodecConfig::new(48000, 2, usize::MAX / 2, 64, Application::Audio).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn legal_sizes_follow_sample_rate() {
        assert_eq!(legal_frame_sizes(8000), vec![20, 40, 80, 160, 320, 480]);
        assert!(CodecConfig::new(8000, 1, 160, 64, Application::Voip).is_ok());
        assert!(CodecConfig::new(8000, 1, 960, 64, Application::Voip).is_err());
    }

    #[test]
    fn run_config_rejects_bad_frame_size() {
        let mut config = Config::default();
        config.opus.frame_size = 1000;
        assert!(RunConfig::from_config(&config).is_err());
    }

    #[test]
    fn frame_geometry() {
        let codec = CodecConfig::new(48000, 2, 1920, 64, Application::Audio).unwrap();
        assert_eq!(codec.samples_per_frame(), 3840);
        assert_eq!(codec.max_packet_bytes(), 7680);
    }

    #[test]
    fn run_config_from_file_config() {
        let mut config = Config::default();
        config.opus.application = "nonsense".to_string();
        config.opus.bitrate = 1000;
        config.output.cover_format = "png".to_string();

        let run = RunConfig::from_config(&config).unwrap();

        assert_eq!(run.codec.application, Application::Audio);
        assert_eq!(run.codec.bitrate, 64_000);
        assert_eq!(run.cover_format, CoverFormat::Png);
        assert_eq!(run.queue_depth, 10);
    }

    #[test]
    fn run_config_rejects_zero_queue_depth() {
        let mut config = Config::default();
        config.output.queue_depth = 0;
        assert!(RunConfig::from_config(&config).is_err());
    }

    #[test]
    fn default_run_config_matches_default_file_config() {
        let run = RunConfig::from_config(&Config::default()).unwrap();
        assert_eq!(run, RunConfig::default());
    }
}
