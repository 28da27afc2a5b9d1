//! Timed accelerator path: allocate, upload, launch, finish, download

use crate::accelerator::{AcceleratorSession, BufferAccess, ComputeBackend};
use crate::error::HarnessError;
use crate::timing::{HostTimer, TimingSample};
use crate::workload::Matrix;
use tracing::{debug, info};

/// Moves matrices through an open [`AcceleratorSession`]
pub struct DataTransferPipeline<'s, B: ComputeBackend> {
    session: &'s AcceleratorSession<B>,
}

impl<'s, B: ComputeBackend> DataTransferPipeline<'s, B> {
    pub fn new(session: &'s AcceleratorSession<B>) -> Self {
        Self { session }
    }

    /// Compute `result = a * b` on the device
    ///
    /// The timed window spans buffer allocation through the last read-back.
    /// All three buffers are read back, inputs included. Buffers are
    /// released on return, whether or not a step failed.
    pub fn run(
        &self,
        a: &mut Matrix,
        b: &mut Matrix,
        result: &mut Matrix,
    ) -> Result<TimingSample, HarnessError> {
        let dimension = a.dimension();
        if b.dimension() != dimension || result.dimension() != dimension {
            return Err(HarnessError::runtime(
                "Accelerator inputs and result must share one dimension",
            ));
        }
        let elements = dimension.elements();
        let backend = self.session.backend();

        let timer = HostTimer::start();

        let buf_a = backend.create_buffer(elements, BufferAccess::ReadOnly)?;
        let buf_b = backend.create_buffer(elements, BufferAccess::ReadOnly)?;
        let buf_result = backend.create_buffer(elements, BufferAccess::ReadWrite)?;
        debug!("Allocated 3 device buffers of {} elements", elements);

        backend.write_buffer(&buf_a, a.as_slice())?;
        backend.write_buffer(&buf_b, b.as_slice())?;
        backend.write_buffer(&buf_result, result.as_slice())?;

        self.session.run_kernel(
            &buf_a,
            &buf_b,
            &buf_result,
            dimension.kernel_arg(),
            elements,
        )?;
        backend.finish()?;

        backend.read_buffer(&buf_a, a.as_mut_slice())?;
        backend.read_buffer(&buf_b, b.as_mut_slice())?;
        backend.read_buffer(&buf_result, result.as_mut_slice())?;

        let sample = timer.stop();
        info!(
            "Accelerator pipeline finished in {:.3} ms on {}",
            sample.elapsed_ms(),
            self.session.device_name()
        );
        Ok(sample)
    }
}
