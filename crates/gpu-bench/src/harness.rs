//! One benchmark run, end to end

use crate::accelerator::{AcceleratorSession, ComputeBackend};
use crate::config::BenchConfig;
use crate::error::HarnessError;
use crate::pipeline::DataTransferPipeline;
use crate::reference::ReferenceComputeEngine;
use crate::report::{ComparisonReport, ComparisonReporter};
use crate::workload::{Dimension, Workload, WorkloadGenerator};
use tracing::info;

/// Open a session on `backend`, generate a random workload and compare
///
/// The session is opened first, so a missing or broken kernel aborts the
/// run before any matrix work is done.
pub fn run_benchmark<B: ComputeBackend>(
    backend: B,
    config: &BenchConfig,
    dimension: Dimension,
) -> Result<ComparisonReport, HarnessError> {
    let session = AcceleratorSession::open(backend, &config.kernel)?;
    let mut workload = WorkloadGenerator::from_entropy().generate(dimension);
    run_with_workload(&session, &mut workload)
}

/// Run both compute paths over `workload`
///
/// Fills `result_cpu` and `result_gpu`. Any accelerator failure discards the
/// reference timing.
pub fn run_with_workload<B: ComputeBackend>(
    session: &AcceleratorSession<B>,
    workload: &mut Workload,
) -> Result<ComparisonReport, HarnessError> {
    let dimension = workload.dimension();
    info!(
        "Benchmarking {}x{} matrix multiplication",
        dimension.get(),
        dimension.get()
    );

    let cpu = ReferenceComputeEngine::run(workload);

    let Workload {
        a, b, result_gpu, ..
    } = workload;
    let gpu = DataTransferPipeline::new(session).run(a, b, result_gpu)?;

    Ok(
        ComparisonReporter::compare(dimension, session.device_name(), &cpu, &gpu)
            .with_emulated(session.backend().is_emulated()),
    )
}
