use anyhow::Result;
use tracing::{error, info};

use gpu_bench::{
    cli::{parse_args, setup_logging},
    error::EXIT_FAILURE,
    BenchConfig, ComparisonReport, Dimension, HarnessError,
};

fn main() {
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => report_failure(&err),
    };
    std::process::exit(exit_code);
}

fn run() -> Result<()> {
    let config = parse_args()?;
    setup_logging(&config.logging.level, config.logging.ansi)?;

    info!("Starting gpu-bench v{}", env!("CARGO_PKG_VERSION"));

    let dimension = Dimension::default();
    let report = run_opencl(&config, dimension)?;

    println!("{}", report.render(config.report.format)?);
    Ok(())
}

#[cfg(feature = "opencl")]
fn run_opencl(config: &BenchConfig, dimension: Dimension) -> Result<ComparisonReport, HarnessError> {
    let backend = gpu_bench::OpenClBackend::select(&config.device)?;
    gpu_bench::run_benchmark(backend, config, dimension)
}

#[cfg(not(feature = "opencl"))]
fn run_opencl(_config: &BenchConfig, _dimension: Dimension) -> Result<ComparisonReport, HarnessError> {
    Err(HarnessError::DeviceUnavailable {
        reason: "gpu-bench was built without the `opencl` feature (rebuild with --features opencl)".to_string(),
    })
}

/// Write the diagnostic to stderr and pick the exit status
fn report_failure(err: &anyhow::Error) -> i32 {
    let Some(harness_error) = err.downcast_ref::<HarnessError>() else {
        error!("Benchmark aborted");
        eprintln!("{err:#}");
        return EXIT_FAILURE;
    };

    error!("Benchmark aborted: {}", harness_error);
    eprintln!("{harness_error}");
    for log in harness_error.build_logs() {
        eprintln!("{log}");
    }
    harness_error.exit_code()
}
