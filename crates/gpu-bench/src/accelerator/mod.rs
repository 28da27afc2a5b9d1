//! Accelerator access for the benchmark
//!
//! [`ComputeBackend`] is the seam between harness logic and a compute
//! platform. Two implementations exist:
//! - [`opencl::OpenClBackend`] (feature `opencl`) drives a real device through
//!   the `ocl` crate
//! - [`host::HostBackend`] emulates a device on the host for tests; it runs
//!   registered Rust work-item functions, not the OpenCL source
//!
//! [`AcceleratorSession`] performs source loading, compilation and entry-point
//! binding on top of a backend whose device is already selected.

pub mod host;
#[cfg(feature = "opencl")]
pub mod opencl;
pub mod session;

pub use host::HostBackend;
#[cfg(feature = "opencl")]
pub use opencl::OpenClBackend;
pub use session::{load_kernel_source, AcceleratorSession};

use crate::error::HarnessError;

/// Kernel entry point looked up in the compiled program by default
pub const KERNEL_ENTRY_POINT: &str = "matmul";

/// Buffer access from the kernel's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    /// Kernel reads, host writes
    ReadOnly,
    ReadWrite,
}

/// A compute device with a selected context and queue
///
/// Commands are issued in order. Reads and writes are blocking; kernel
/// enqueue is not, so callers must [`finish`](Self::finish) before relying on
/// kernel output.
#[cfg_attr(test, mockall::automock(type Program = (); type Kernel = (); type Buffer = usize;))]
pub trait ComputeBackend {
    type Program;
    type Kernel;
    type Buffer;

    /// Human-readable device identity, used in build logs and reports
    fn device_name(&self) -> String;

    /// Whether the device is emulated on the host rather than real hardware
    fn is_emulated(&self) -> bool {
        false
    }

    /// Compile kernel source for the selected device
    fn build_program(&self, source: &str) -> Result<Self::Program, HarnessError>;

    /// Bind `entry_point` as `(buffer, buffer, buffer, int)`
    fn bind_kernel(
        &self,
        program: &Self::Program,
        entry_point: &str,
    ) -> Result<Self::Kernel, HarnessError>;

    /// Allocate device storage for `len` elements
    fn create_buffer(&self, len: usize, access: BufferAccess)
        -> Result<Self::Buffer, HarnessError>;

    /// Blocking host-to-device copy
    fn write_buffer(&self, buffer: &Self::Buffer, data: &[f64]) -> Result<(), HarnessError>;

    /// Blocking device-to-host copy
    fn read_buffer(&self, buffer: &Self::Buffer, data: &mut [f64]) -> Result<(), HarnessError>;

    /// Enqueue one kernel launch over `global_work_size` work-items
    fn enqueue_kernel(
        &self,
        kernel: &Self::Kernel,
        a: &Self::Buffer,
        b: &Self::Buffer,
        result: &Self::Buffer,
        dimension: i32,
        global_work_size: usize,
    ) -> Result<(), HarnessError>;

    /// Block until all enqueued work has completed
    fn finish(&self) -> Result<(), HarnessError>;
}

#[cfg(test)]
mod test;
