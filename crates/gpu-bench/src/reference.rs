//! Host reference matrix multiplication

use crate::timing::{measure, TimingSample};
use crate::workload::Workload;
use tracing::{debug, info};

/// Sequential triple-loop matrix product, the baseline for the comparison
pub struct ReferenceComputeEngine;

impl ReferenceComputeEngine {
    /// `c[i][j] = Σ_k a[i][k] * b[k][j]` over row-major N×N slices
    ///
    /// Loop order is i, j, k with one accumulator per output element. No
    /// blocking or threads, so the cost is sequential arithmetic plus the
    /// strided reads of `b`.
    pub fn multiply(a: &[f64], b: &[f64], c: &mut [f64], n: usize) {
        debug_assert_eq!(a.len(), n * n);
        debug_assert_eq!(b.len(), n * n);
        debug_assert_eq!(c.len(), n * n);

        for i in 0..n {
            for j in 0..n {
                let mut acc = 0.0f64;
                for k in 0..n {
                    acc += a[i * n + k] * b[k * n + j];
                }
                c[i * n + j] = acc;
            }
        }
    }

    /// Multiply the workload inputs into `result_cpu`, timing only the loop
    pub fn run(workload: &mut Workload) -> TimingSample {
        let n = workload.dimension().get();
        debug!("Running reference multiplication for N={}", n);

        let Workload {
            a, b, result_cpu, ..
        } = workload;
        let (a, b, c) = (a.as_slice(), b.as_slice(), result_cpu.as_mut_slice());

        let ((), sample) = measure(|| Self::multiply(a, b, c, n));

        info!(
            "Reference multiplication finished in {:.3} ms",
            sample.elapsed_ms()
        );
        sample
    }
}
