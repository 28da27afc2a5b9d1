use super::*;
use crate::config::KernelConfig;
use crate::error::{DeviceBuildLog, CL_BUILD_PROGRAM_FAILURE};
use mockall::Sequence;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

const NAIVE_SOURCE: &str = r#"
__kernel void matmul(__global const double* A, __global const double* B,
                     __global double* C, int N) {
    int gid = get_global_id(0);
    C[gid] = A[gid] * B[gid];
}
"#;

fn source_file(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn kernel_config(path: impl Into<PathBuf>) -> KernelConfig {
    KernelConfig {
        source_path: path.into(),
        ..Default::default()
    }
}

fn named_mock(name: &str) -> MockComputeBackend {
    let mut mock = MockComputeBackend::new();
    mock.expect_device_name().return_const(name.to_string());
    mock
}

#[test]
fn test_open_runs_build_then_bind() {
    let file = source_file(NAIVE_SOURCE);
    let mut seq = Sequence::new();
    let mut mock = MockComputeBackend::new();

    mock.expect_device_name()
        .times(1)
        .in_sequence(&mut seq)
        .return_const("Mock GPU".to_string());
    mock.expect_build_program()
        .withf(|source| source.contains("__kernel void matmul"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));
    mock.expect_bind_kernel()
        .withf(|_, name| name.to_string() == "matmul")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    let session = AcceleratorSession::open(mock, &kernel_config(file.path())).unwrap();

    assert_eq!(session.device_name(), "Mock GPU");
    assert_eq!(session.entry_point(), KERNEL_ENTRY_POINT);
}

#[test]
fn test_missing_source_stops_before_build() {
    let mut mock = named_mock("Mock GPU");
    mock.expect_build_program().never();
    mock.expect_bind_kernel().never();
    mock.expect_create_buffer().never();

    let result = AcceleratorSession::open(mock, &kernel_config("/nonexistent/matmul.cl"));

    match result {
        Err(HarnessError::SourceNotFound { path, .. }) => {
            assert_eq!(path, PathBuf::from("/nonexistent/matmul.cl"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("session opened without kernel source"),
    }
}

#[test]
fn test_build_failure_carries_device_log() {
    let file = source_file("__kernel void matmul( {");
    let mut mock = named_mock("Mock GPU");
    mock.expect_build_program().times(1).returning(|_| {
        Err(HarnessError::BuildFailure {
            code: CL_BUILD_PROGRAM_FAILURE,
            logs: vec![DeviceBuildLog {
                device: "Mock GPU".to_string(),
                log: "error: expected ')'".to_string(),
            }],
        })
    });
    mock.expect_bind_kernel().never();

    let err = AcceleratorSession::open(mock, &kernel_config(file.path()))
        .err()
        .unwrap();

    assert_eq!(err.exit_code(), CL_BUILD_PROGRAM_FAILURE);
    assert_eq!(err.build_logs().len(), 1);
    assert_eq!(err.build_logs()[0].device, "Mock GPU");
}

#[test]
fn test_missing_entry_point_from_backend() {
    let file = source_file(NAIVE_SOURCE);
    let mut mock = named_mock("Mock GPU");
    mock.expect_build_program().returning(|_| Ok(()));
    mock.expect_bind_kernel().returning(|_, name| {
        Err(HarnessError::EntryPointMissing {
            name: name.to_string(),
        })
    });

    let config = KernelConfig {
        source_path: file.path().to_path_buf(),
        entry_point: "matmul_tiled".to_string(),
    };
    let err = AcceleratorSession::open(mock, &config).err().unwrap();

    assert!(matches!(err, HarnessError::EntryPointMissing { ref name } if name == "matmul_tiled"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_host_session_binds_declared_kernel() {
    let file = source_file(NAIVE_SOURCE);

    let session =
        AcceleratorSession::open(HostBackend::matmul(), &kernel_config(file.path())).unwrap();

    assert_eq!(session.device_name(), host::HOST_DEVICE_NAME);
    assert_eq!(session.backend().allocated_buffers(), 0);
}

#[test]
fn test_host_session_rejects_undeclared_entry_point() {
    let file = source_file("__kernel void transpose(__global double* M, int N) {}");

    let err = AcceleratorSession::open(HostBackend::matmul(), &kernel_config(file.path()))
        .err()
        .unwrap();

    assert!(matches!(err, HarnessError::EntryPointMissing { ref name } if name == "matmul"));
}

#[test]
fn test_host_session_requires_registered_work_item() {
    let file = source_file(NAIVE_SOURCE);

    let err = AcceleratorSession::open(HostBackend::new(), &kernel_config(file.path()))
        .err()
        .unwrap();

    assert!(matches!(err, HarnessError::GenericRuntimeFailure { .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_load_kernel_source_reads_text() {
    let file = source_file(NAIVE_SOURCE);
    assert_eq!(load_kernel_source(file.path()).unwrap(), NAIVE_SOURCE);
}
