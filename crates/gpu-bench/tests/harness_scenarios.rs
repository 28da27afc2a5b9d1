//! End-to-end runs against the host emulation backend
//!
//! The emulator runs registered Rust work items, so these scenarios cover the
//! harness plumbing and the front-end build checks, not kernel numerics.

use gpu_bench::{
    run_benchmark, run_with_workload, AcceleratorSession, BenchConfig, ComputeBackend,
    Dimension, HarnessError, HostBackend, KernelConfig, Matrix, ReportFormat, Workload,
    WorkloadGenerator, MATRIX_DIMENSION,
};
use std::path::PathBuf;

fn kernel_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn config_for(relative: &str) -> BenchConfig {
    let mut config = BenchConfig::default();
    config.kernel = KernelConfig {
        source_path: kernel_path(relative),
        ..Default::default()
    };
    config
}

fn shipped_session() -> AcceleratorSession<HostBackend> {
    AcceleratorSession::open(HostBackend::matmul(), &config_for("kernels/matmul.cl").kernel).unwrap()
}

#[test]
fn identity_times_matrix_matches_on_both_paths() {
    let session = shipped_session();
    let dimension = Dimension::new(2).unwrap();
    let identity = Matrix::from_vec(dimension, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let b = Matrix::from_vec(dimension, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    let mut workload = Workload::from_inputs(identity, b).unwrap();

    let report = run_with_workload(&session, &mut workload).unwrap();

    assert_eq!(workload.result_cpu.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
    assert_eq!(workload.result_gpu.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
    assert_eq!(report.dimension, 2);
    assert_eq!(report.device, session.device_name());
}

#[test]
fn inputs_survive_the_round_trip() {
    let session = shipped_session();
    let mut workload = WorkloadGenerator::from_seed(7).generate(Dimension::new(16).unwrap());
    let a_before = workload.a.clone();
    let b_before = workload.b.clone();

    run_with_workload(&session, &mut workload).unwrap();

    assert_eq!(workload.a, a_before);
    assert_eq!(workload.b, b_before);
    assert_eq!(workload.result_cpu, workload.result_gpu);
}

#[test]
fn repeated_runs_produce_identical_results() {
    let session = shipped_session();
    let mut first = WorkloadGenerator::from_seed(42).generate(Dimension::new(8).unwrap());
    let mut second = first.clone();

    run_with_workload(&session, &mut first).unwrap();
    run_with_workload(&session, &mut second).unwrap();

    assert_eq!(first.result_cpu, second.result_cpu);
    assert_eq!(first.result_gpu, second.result_gpu);
}

#[test]
fn missing_kernel_source_aborts_with_exit_one() {
    let config = config_for("kernels/does_not_exist.cl");

    let err = run_benchmark(HostBackend::matmul(), &config, Dimension::new(4).unwrap()).unwrap_err();

    assert!(matches!(err, HarnessError::SourceNotFound { .. }));
    assert!(err.to_string().contains("does_not_exist.cl"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn broken_kernel_reports_build_log_for_device() {
    let config = config_for("tests/fixtures/broken.cl");
    let backend = HostBackend::with_name("Emulated Test Device");

    let err = run_benchmark(backend, &config, Dimension::new(4).unwrap()).unwrap_err();

    assert_eq!(err.platform_code(), Some(-11));
    assert_eq!(err.exit_code(), -11);
    let logs = err.build_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].device, "Emulated Test Device");
    assert!(logs[0]
        .to_string()
        .starts_with("\tBuild log for device: Emulated Test Device\n\n"));
}

#[test]
fn syntax_error_in_statement_fails_build() {
    let config = config_for("tests/fixtures/syntax_error.cl");

    let err = run_benchmark(HostBackend::matmul(), &config, Dimension::new(4).unwrap()).unwrap_err();

    assert!(matches!(err, HarnessError::BuildFailure { .. }));
    assert_eq!(err.exit_code(), -11);
    assert!(err.build_logs()[0].log.contains("expected expression"));
}

#[test]
fn emulator_output_comes_from_registered_work_item() {
    let source = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(
        source.path(),
        "__kernel void matmul(__global const double* A, __global const double* B,\n\
         __global double* C, int N) {\n    C[get_global_id(0)] = -1.0;\n}\n",
    )
    .unwrap();
    let kernel = KernelConfig {
        source_path: source.path().to_path_buf(),
        ..Default::default()
    };
    let backend = HostBackend::new().with_kernel("matmul", |_, _, _, _| -1.0);
    let session = AcceleratorSession::open(backend, &kernel).unwrap();

    let dimension = Dimension::new(2).unwrap();
    let identity = Matrix::from_vec(dimension, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
    let b = Matrix::from_vec(dimension, vec![5.0, 6.0, 7.0, 8.0]).unwrap();
    let mut workload = Workload::from_inputs(identity, b).unwrap();

    let report = run_with_workload(&session, &mut workload).unwrap();

    assert_eq!(workload.result_cpu.as_slice(), &[5.0, 6.0, 7.0, 8.0]);
    assert_eq!(workload.result_gpu.as_slice(), &[-1.0; 4]);
    assert!(report.emulated);
}

#[test]
fn kernel_without_entry_point_is_rejected() {
    let config = config_for("tests/fixtures/no_entry.cl");

    let err = run_benchmark(HostBackend::matmul(), &config, Dimension::new(4).unwrap()).unwrap_err();

    assert!(matches!(err, HarnessError::EntryPointMissing { ref name } if name == "matmul"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn full_size_run_reports_rounded_speedup() {
    let config = config_for("kernels/matmul.cl");

    let report = run_benchmark(HostBackend::matmul(), &config, Dimension::default()).unwrap();

    assert_eq!(report.dimension, MATRIX_DIMENSION);
    assert!(report.cpu_time_ms > 0.0);
    assert!(report.gpu_time_ms > 0.0);

    let expected = (report.cpu_time_ms / report.gpu_time_ms).round();
    assert_eq!(report.rounded_speedup(), Some(expected));

    let text = report.render(ReportFormat::Text).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("CPU time for a 512*512 matrix multiplication: "));
    let device = report.device.as_str();
    assert!(lines[1].starts_with(&format!("{device} time for a 512*512 matrix multiplication: ")));
    assert_eq!(
        lines[2],
        format!("The {device} proves to be {expected:.0} times faster.")
    );
    assert!(!text.contains("GPU"));
}

#[test]
fn json_report_round_trips_through_serde() {
    let session = shipped_session();
    let mut workload = WorkloadGenerator::from_seed(3).generate(Dimension::new(4).unwrap());

    let report = run_with_workload(&session, &mut workload).unwrap();
    let json = report.render(ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["dimension"], 4);
    assert_eq!(value["device"], session.backend().device_name());
}

#[test]
fn each_run_allocates_three_buffers() {
    let session = shipped_session();
    let mut workload = WorkloadGenerator::from_seed(1).generate(Dimension::new(4).unwrap());

    run_with_workload(&session, &mut workload).unwrap();
    run_with_workload(&session, &mut workload).unwrap();

    assert_eq!(session.backend().allocated_buffers(), 6);
}
