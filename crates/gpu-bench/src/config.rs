//! Benchmark configuration
//!
//! Built once at start-up from defaults, an optional TOML file, `GPU_BENCH_*`
//! environment variables and command-line overrides, then passed by
//! reference to backend selection, the accelerator session and the report.

use common::config::{load_config, load_from_file, LoggingConfig};
use common::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::accelerator::KERNEL_ENTRY_POINT;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BenchConfig {
    pub kernel: KernelConfig,
    pub device: DeviceConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Where the kernel comes from and which entry point to bind
///
/// A relative `source_path` resolves against the working directory. The
/// default suits runs from `crates/gpu-bench`; the workspace `config.toml`
/// points runs from the repository root at the same file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KernelConfig {
    pub source_path: PathBuf,
    pub entry_point: String,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("kernels/matmul.cl"),
            entry_point: KERNEL_ENTRY_POINT.to_string(),
        }
    }
}

/// Device selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Index into the list of OpenCL platforms
    pub platform_index: usize,
    pub device_type: DeviceKind,
    /// Index into the platform's devices of `device_type`
    pub device_index: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// The platform's default device
    #[default]
    Default,
    Gpu,
    Cpu,
    Accelerator,
    All,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

macro_rules! impl_keyword_enum {
    ($ty:ident, $key:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const VARIANTS: &'static [&'static str] = &[$($name),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(ConfigurationError::invalid_value(
                        $key,
                        s,
                        format!("expected one of {}", Self::VARIANTS.join(", ")),
                    )),
                }
            }
        }
    };
}

impl_keyword_enum!(DeviceKind, "device.device_type", {
    Default => "default",
    Gpu => "gpu",
    Cpu => "cpu",
    Accelerator => "accelerator",
    All => "all",
});

impl_keyword_enum!(ReportFormat, "report.format", {
    Text => "text",
    Json => "json",
});

impl BenchConfig {
    /// Load from defaults, the optional file and `GPU_BENCH_*` variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigurationError> {
        let config: Self = match config_path {
            Some(path) => load_from_file(&path)?,
            None => load_config()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.kernel.source_path.as_os_str().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "kernel.source_path",
                "",
                "path must not be empty",
            ));
        }

        let entry_point = &self.kernel.entry_point;
        let is_identifier = entry_point
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && entry_point
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !is_identifier {
            return Err(ConfigurationError::invalid_value(
                "kernel.entry_point",
                entry_point,
                "must be a C identifier",
            ));
        }

        if !self.logging.is_valid_level() {
            return Err(ConfigurationError::invalid_value(
                "logging.level",
                &self.logging.level,
                "expected one of error, warn, info, debug, trace",
            ));
        }

        Ok(())
    }
}
