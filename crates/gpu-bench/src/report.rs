//! CPU vs accelerator comparison

use crate::config::ReportFormat;
use crate::timing::TimingSample;
use crate::workload::Dimension;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one benchmark run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonReport {
    pub dimension: usize,
    pub device: String,
    pub cpu_time_ms: f64,
    pub gpu_time_ms: f64,
    /// `cpu_time_ms / gpu_time_ms`, `None` when the ratio is not finite
    pub speedup: Option<f64>,
    /// Accelerator timings came from a host emulation, not a GPU
    #[serde(default)]
    pub emulated: bool,
}

pub struct ComparisonReporter;

impl ComparisonReporter {
    pub fn compare(
        dimension: Dimension,
        device: impl Into<String>,
        cpu: &TimingSample,
        gpu: &TimingSample,
    ) -> ComparisonReport {
        ComparisonReport::new(
            dimension.get(),
            device,
            cpu.elapsed_ms(),
            gpu.elapsed_ms(),
        )
    }
}

impl ComparisonReport {
    pub fn new(
        dimension: usize,
        device: impl Into<String>,
        cpu_time_ms: f64,
        gpu_time_ms: f64,
    ) -> Self {
        Self {
            dimension,
            device: device.into(),
            cpu_time_ms,
            gpu_time_ms,
            speedup: speedup(cpu_time_ms, gpu_time_ms),
            emulated: false,
        }
    }

    pub fn with_emulated(mut self, emulated: bool) -> Self {
        self.emulated = emulated;
        self
    }

    /// "GPU" for real devices, the device name for an emulation
    pub fn accelerator_label(&self) -> &str {
        if self.emulated {
            self.device.as_str()
        } else {
            "GPU"
        }
    }

    /// Speedup rounded half away from zero
    pub fn rounded_speedup(&self) -> Option<f64> {
        self.speedup.map(f64::round)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, serde_json::Error> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => serde_json::to_string_pretty(self),
        }
    }
}

fn speedup(cpu_time_ms: f64, gpu_time_ms: f64) -> Option<f64> {
    if gpu_time_ms <= 0.0 {
        return None;
    }
    let ratio = cpu_time_ms / gpu_time_ms;
    ratio.is_finite().then_some(ratio)
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dimension;
        let label = self.accelerator_label();
        writeln!(
            f,
            "CPU time for a {n}*{n} matrix multiplication: {:.3} ms",
            self.cpu_time_ms
        )?;
        writeln!(
            f,
            "{label} time for a {n}*{n} matrix multiplication: {:.3} ms",
            self.gpu_time_ms
        )?;
        match self.rounded_speedup() {
            Some(speedup) => write!(f, "The {label} proves to be {speedup:.0} times faster."),
            None => write!(f, "The {label} speedup is undefined ({label} time was zero)."),
        }
    }
}
