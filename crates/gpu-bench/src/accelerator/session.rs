//! Program compilation and kernel binding for one run

use super::ComputeBackend;
use crate::config::KernelConfig;
use crate::error::HarnessError;
use std::path::Path;
use tracing::{debug, error, info};

/// Read kernel source text from `path`
pub fn load_kernel_source(path: &Path) -> Result<String, HarnessError> {
    std::fs::read_to_string(path).map_err(|source| HarnessError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// Compiled program and bound kernel on a selected device
///
/// Owns the backend for the duration of the run. Dropping the session
/// releases the kernel, program and device context.
pub struct AcceleratorSession<B: ComputeBackend> {
    kernel: B::Kernel,
    _program: B::Program,
    backend: B,
    device_name: String,
    entry_point: String,
}

impl<B: ComputeBackend> AcceleratorSession<B> {
    /// Load, build and bind the configured kernel
    ///
    /// Steps run in order and stop at the first failure; nothing is retried.
    pub fn open(backend: B, config: &KernelConfig) -> Result<Self, HarnessError> {
        let device_name = backend.device_name();
        info!("Using compute device: {}", device_name);

        let source = load_kernel_source(&config.source_path)?;
        debug!(
            "Loaded {} bytes of kernel source from {}",
            source.len(),
            config.source_path.display()
        );

        let program = backend.build_program(&source).map_err(|e| {
            error!("Kernel program failed to build on {}", device_name);
            e
        })?;
        info!("Kernel program built for {}", device_name);

        let kernel = backend.bind_kernel(&program, &config.entry_point)?;
        debug!("Bound kernel entry point '{}'", config.entry_point);

        Ok(Self {
            kernel,
            _program: program,
            backend,
            device_name,
            entry_point: config.entry_point.clone(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn kernel(&self) -> &B::Kernel {
        &self.kernel
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Launch the bound kernel once over `global_work_size` work-items
    pub fn run_kernel(
        &self,
        a: &B::Buffer,
        b: &B::Buffer,
        result: &B::Buffer,
        dimension: i32,
        global_work_size: usize,
    ) -> Result<(), HarnessError> {
        self.backend
            .enqueue_kernel(&self.kernel, a, b, result, dimension, global_work_size)
    }
}
