//! # gpu-bench
//!
//! Times a naive host matrix multiplication against the same product
//! computed by a run-time compiled OpenCL kernel, and reports the speedup.

pub mod accelerator;
pub mod cli;
pub mod config;
pub mod error;
pub mod harness;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod timing;
pub mod workload;

pub use accelerator::{AcceleratorSession, BufferAccess, ComputeBackend, HostBackend};
#[cfg(feature = "opencl")]
pub use accelerator::OpenClBackend;
pub use config::{BenchConfig, DeviceKind, KernelConfig, ReportFormat};
pub use error::{DeviceBuildLog, HarnessError};
pub use harness::{run_benchmark, run_with_workload};
pub use report::{ComparisonReport, ComparisonReporter};
pub use timing::TimingSample;
pub use workload::{Dimension, Matrix, Workload, WorkloadGenerator, MATRIX_DIMENSION};
