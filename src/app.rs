//! Transcoding application entry point.
//!
//! Resolves configuration and input, then runs one encode or decode
//! pipeline against stdout.

use crate::cli::Cli;
use crate::config::{Config, RunConfig};
use crate::defaults;
use crate::input::{InputSource, PcmInput, open_decode_input, open_encode_input};
use crate::metadata::{Metadata, cover, probe};
use crate::pipeline::{Direction, Pipeline, RunReport, keep_alive};
use anyhow::{Context, Result};
use std::path::Path;

/// Runs the command described by `cli`.
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let config = apply_cli_overrides(config, cli);
    let run_config = RunConfig::from_config(&config).context("invalid settings")?;

    let source = InputSource::from_arg(cli.input_arg().unwrap_or(defaults::STDIN_INPUT));
    source.validate()?;

    let report = match Direction::from(cli.mode) {
        Direction::Encode => run_encode(&source, run_config)?,
        Direction::Decode => run_decode(&source, run_config)?,
    };
    log_report(&report);

    if cli.wait {
        tracing::info!("run finished, staying alive");
        let (hold, _release) = keep_alive();
        hold.hold();
    }

    Ok(())
}

/// Loads the config file and applies environment overrides.
///
/// An explicit `--config` path must exist; the default path may be absent.
pub fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("loading {}", path.display()))?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)
            .with_context(|| format!("loading {}", default_path.display()))?
    } else {
        Config::default()
    };

    Ok(config.with_env_overrides()?)
}

/// CLI flags win over file and environment values.
pub fn apply_cli_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(volume) = cli.volume {
        config.opus.volume = volume;
    }
    if let Some(channels) = cli.channels {
        config.opus.channels = channels;
    }
    if let Some(sample_rate) = cli.sample_rate {
        config.opus.sample_rate = sample_rate;
    }
    if let Some(frame_size) = cli.frame_size {
        config.opus.frame_size = frame_size;
    }
    if let Some(bitrate) = cli.bitrate {
        config.opus.bitrate = bitrate;
    }
    if let Some(application) = &cli.application {
        config.opus.application = application.clone();
    }
    if let Some(cover_format) = &cli.cover_format {
        config.output.cover_format = cover_format.clone();
    }
    if cli.raw {
        config.output.raw = true;
    }
    config
}

fn run_encode(source: &InputSource, config: RunConfig) -> Result<RunReport> {
    let metadata = if config.raw {
        None
    } else {
        Some(build_metadata(source, &config)?)
    };

    let PcmInput {
        reader,
        mut converter,
    } = open_encode_input(source, &config)?;

    let report = Pipeline::new(config)
        .start_encode(reader, Box::new(std::io::stdout()), metadata)?
        .wait();

    converter.wait()?;
    Ok(report)
}

fn run_decode(source: &InputSource, config: RunConfig) -> Result<RunReport> {
    let reader = open_decode_input(source)?;
    let report = Pipeline::new(config)
        .start_decode(reader, Box::new(std::io::stdout()))?
        .wait();
    Ok(report)
}

fn build_metadata(source: &InputSource, config: &RunConfig) -> Result<Metadata> {
    let metadata = Metadata::new(config);
    let Some(path) = source.path() else {
        return Ok(metadata);
    };

    let info = probe::probe_file(path)?;
    let cover = cover::extract_cover(path, config.cover_format);
    tracing::debug!(
        path = %path.display(),
        bitrate = info.bitrate,
        has_cover = cover.is_some(),
        "probed input"
    );
    Ok(metadata.with_probe(&info).with_cover(cover))
}

/// Logs per-stage results.
///
/// Stage errors were already reported as they happened; the process still
/// exits normally.
fn log_report(report: &RunReport) {
    for stage in &report.stages {
        tracing::info!(
            stage = stage.stage,
            frames = stage.frames,
            outcome = ?stage.outcome,
            "stage finished"
        );
    }

    if !report.is_clean() {
        tracing::warn!(
            frames = report.frames_written(),
            "run ended early, output may be partial"
        );
    }
}
