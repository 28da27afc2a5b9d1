use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{BenchConfig, DeviceKind, ReportFormat};

pub fn command() -> Command {
    Command::new("gpu-bench")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compare naive CPU and OpenCL matrix multiplication times")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML configuration file")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("kernel")
                .short('k')
                .long("kernel")
                .help("Path to the OpenCL kernel source")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("entry-point")
                .long("entry-point")
                .help("Kernel function to launch")
                .value_name("NAME"),
        )
        .arg(
            Arg::new("platform")
                .long("platform")
                .help("OpenCL platform index")
                .value_name("INDEX")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("device-type")
                .long("device-type")
                .help("OpenCL device type to select from")
                .value_name("TYPE")
                .value_parser(DeviceKind::VARIANTS.to_vec()),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .help("Device index within the selected type")
                .value_name("INDEX")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Report format")
                .value_name("FORMAT")
                .value_parser(ReportFormat::VARIANTS.to_vec()),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Logging level")
                .value_name("LEVEL")
                .value_parser(common::LOG_LEVELS.to_vec()),
        )
}

pub fn parse_args() -> Result<BenchConfig> {
    config_from_matches(&command().get_matches())
}

/// Load configuration and apply command-line overrides on top
pub fn config_from_matches(matches: &ArgMatches) -> Result<BenchConfig> {
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = BenchConfig::load(config_path).context("Failed to load configuration")?;

    if let Some(kernel) = matches.get_one::<String>("kernel") {
        config.kernel.source_path = PathBuf::from(kernel);
    }

    if let Some(entry_point) = matches.get_one::<String>("entry-point") {
        config.kernel.entry_point = entry_point.clone();
    }

    if let Some(platform) = matches.get_one::<usize>("platform") {
        config.device.platform_index = *platform;
    }

    if let Some(device_type) = matches.get_one::<String>("device-type") {
        config.device.device_type = device_type.parse()?;
    }

    if let Some(device) = matches.get_one::<usize>("device") {
        config.device.device_index = *device;
    }

    if let Some(format) = matches.get_one::<String>("format") {
        config.report.format = format.parse()?;
    }

    if matches.get_flag("debug") {
        config.logging.level = "debug".to_string();
    } else if let Some(log_level) = matches.get_one::<String>("log-level") {
        config.logging.level = log_level.clone();
    }

    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

/// Install the global tracing subscriber; logs go to stderr
pub fn setup_logging(level: &str, ansi: bool) -> Result<()> {
    let level_filter = match level {
        "error" => tracing::Level::ERROR,
        "warn" => tracing::Level::WARN,
        "info" => tracing::Level::INFO,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => return Err(anyhow::anyhow!("Invalid log level: {}", level)),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_level(true)
                .with_target(false)
                .with_ansi(ansi),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            level_filter,
        ))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
