//! Error type for the benchmark harness
//!
//! Every fallible harness operation returns [`HarnessError`]. Nothing is
//! retried: each variant aborts the run and maps to a process exit status
//! through [`HarnessError::exit_code`].

use common::ConfigurationError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Generic failure exit status
pub const EXIT_FAILURE: i32 = 1;

/// `CL_BUILD_PROGRAM_FAILURE`
pub const CL_BUILD_PROGRAM_FAILURE: i32 = -11;

/// `CL_INVALID_VALUE`
pub const CL_INVALID_VALUE: i32 = -30;

/// `CL_INVALID_KERNEL_NAME`
pub const CL_INVALID_KERNEL_NAME: i32 = -46;

/// `CL_INVALID_KERNEL_ARGS`
pub const CL_INVALID_KERNEL_ARGS: i32 = -52;

/// `CL_INVALID_WORK_DIMENSION`
pub const CL_INVALID_WORK_DIMENSION: i32 = -53;

/// Compiler output for one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceBuildLog {
    pub device: String,
    pub log: String,
}

impl fmt::Display for DeviceBuildLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\tBuild log for device: {}\n\n{}\n",
            self.device, self.log
        )
    }
}

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("No compute device available: {reason}")]
    DeviceUnavailable { reason: String },

    #[error("Cannot open kernel source {}: {source}", .path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Kernel program failed to build ({code})")]
    BuildFailure { code: i32, logs: Vec<DeviceBuildLog> },

    #[error("Kernel entry point '{name}' not found in compiled program")]
    EntryPointMissing { name: String },

    #[error("Device operation '{operation}' failed ({code}): {message}")]
    DeviceOperationFailure {
        operation: String,
        code: i32,
        message: String,
    },

    #[error("{message}")]
    GenericRuntimeFailure { message: String },
}

impl HarnessError {
    pub fn device_operation(
        operation: impl Into<String>,
        code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::DeviceOperationFailure {
            operation: operation.into(),
            code,
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::GenericRuntimeFailure {
            message: message.into(),
        }
    }

    /// Classify a failed kernel creation for `entry_point`
    ///
    /// Only `CL_INVALID_KERNEL_NAME` means the program lacks the entry point.
    /// Other platform codes are device failures; a failure without a platform
    /// code happened on the host side.
    pub fn kernel_binding(entry_point: &str, code: Option<i32>, message: impl Into<String>) -> Self {
        match code {
            Some(CL_INVALID_KERNEL_NAME) => Self::EntryPointMissing {
                name: entry_point.to_string(),
            },
            Some(code) => Self::device_operation("create kernel", code, message),
            None => Self::runtime(format!(
                "Failed to create kernel '{entry_point}': {}",
                message.into()
            )),
        }
    }

    /// Platform error code, for the variants that carry one
    pub fn platform_code(&self) -> Option<i32> {
        match self {
            Self::BuildFailure { code, .. } | Self::DeviceOperationFailure { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }

    /// Process exit status for this error
    ///
    /// Build and device failures exit with the platform code; everything
    /// else exits with [`EXIT_FAILURE`]. Never returns 0.
    pub fn exit_code(&self) -> i32 {
        match self.platform_code() {
            Some(0) | None => EXIT_FAILURE,
            Some(code) => code,
        }
    }

    /// Per-device compiler logs of a build failure, empty otherwise
    pub fn build_logs(&self) -> &[DeviceBuildLog] {
        match self {
            Self::BuildFailure { logs, .. } => logs,
            _ => &[],
        }
    }
}

impl From<ConfigurationError> for HarnessError {
    fn from(err: ConfigurationError) -> Self {
        Self::runtime(err.to_string())
    }
}
