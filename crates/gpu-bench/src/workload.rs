//! Benchmark workload: the four square matrices of one run

use crate::error::HarnessError;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Matrix dimension used by the `gpu-bench` binary
pub const MATRIX_DIMENSION: usize = 512;

/// Side length N of the square matrices in a run
///
/// Always positive, and N×N fits the kernel's `int` work-item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension(usize);

impl Dimension {
    pub fn new(n: usize) -> Result<Self, HarnessError> {
        if n == 0 {
            return Err(HarnessError::runtime("Matrix dimension must be positive"));
        }
        match n.checked_mul(n) {
            Some(elements) if elements <= i32::MAX as usize => Ok(Self(n)),
            _ => Err(HarnessError::runtime(format!(
                "Matrix dimension {n} exceeds the kernel work-item range"
            ))),
        }
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// N×N
    pub fn elements(self) -> usize {
        self.0 * self.0
    }

    /// N as passed to the kernel's `int` parameter
    pub fn kernel_arg(self) -> i32 {
        // Bounded by the constructor.
        self.0 as i32
    }
}

impl Default for Dimension {
    fn default() -> Self {
        Self(MATRIX_DIMENSION)
    }
}

/// Row-major N×N matrix of `f64`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    dimension: Dimension,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(dimension: Dimension) -> Self {
        Self {
            dimension,
            data: vec![0.0; dimension.elements()],
        }
    }

    pub fn from_vec(dimension: Dimension, data: Vec<f64>) -> Result<Self, HarnessError> {
        if data.len() != dimension.elements() {
            return Err(HarnessError::runtime(format!(
                "Matrix data has {} elements, expected {}",
                data.len(),
                dimension.elements()
            )));
        }
        Ok(Self { dimension, data })
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dimension.get() + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn is_zeroed(&self) -> bool {
        self.data.iter().all(|&value| value == 0.0)
    }
}

/// Inputs A and B plus one result matrix per compute path
#[derive(Debug, Clone)]
pub struct Workload {
    pub a: Matrix,
    pub b: Matrix,
    pub result_cpu: Matrix,
    pub result_gpu: Matrix,
}

impl Workload {
    /// Workload over caller-supplied inputs with zeroed results
    pub fn from_inputs(a: Matrix, b: Matrix) -> Result<Self, HarnessError> {
        if a.dimension() != b.dimension() {
            return Err(HarnessError::runtime(format!(
                "Input dimensions differ: {} vs {}",
                a.dimension().get(),
                b.dimension().get()
            )));
        }
        let dimension = a.dimension();
        Ok(Self {
            a,
            b,
            result_cpu: Matrix::zeros(dimension),
            result_gpu: Matrix::zeros(dimension),
        })
    }

    pub fn dimension(&self) -> Dimension {
        self.a.dimension()
    }
}

/// Fills workloads with values drawn uniformly from (-1.0, 1.0)
pub struct WorkloadGenerator {
    rng: StdRng,
}

impl WorkloadGenerator {
    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self, dimension: Dimension) -> Workload {
        debug!(
            "Generating {}x{} workload",
            dimension.get(),
            dimension.get()
        );
        let a = self.random_matrix(dimension);
        let b = self.random_matrix(dimension);
        Workload {
            a,
            b,
            result_cpu: Matrix::zeros(dimension),
            result_gpu: Matrix::zeros(dimension),
        }
    }

    fn random_matrix(&mut self, dimension: Dimension) -> Matrix {
        // Uniform samples [-1, 1); rejecting -1.0 leaves the open interval.
        let dist = Uniform::new(-1.0f64, 1.0);
        let data = (0..dimension.elements())
            .map(|_| loop {
                let value = dist.sample(&mut self.rng);
                if value > -1.0 {
                    break value;
                }
            })
            .collect();
        Matrix { dimension, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_validation() {
        assert!(Dimension::new(0).is_err());
        assert_eq!(Dimension::new(8).unwrap().elements(), 64);
        assert_eq!(Dimension::new(512).unwrap().kernel_arg(), 512);
        assert!(Dimension::new(46_341).is_err());
        assert_eq!(Dimension::default().get(), MATRIX_DIMENSION);
    }

    #[test]
    fn test_generated_values_in_open_interval() {
        let dimension = Dimension::new(64).unwrap();
        let workload = WorkloadGenerator::from_entropy().generate(dimension);

        for value in workload.a.as_slice().iter().chain(workload.b.as_slice()) {
            assert!(*value > -1.0 && *value < 1.0, "value {value} out of range");
        }
    }

    #[test]
    fn test_results_start_zeroed() {
        let dimension = Dimension::new(16).unwrap();
        let workload = WorkloadGenerator::from_entropy().generate(dimension);

        assert_eq!(workload.a.len(), 256);
        assert_eq!(workload.b.len(), 256);
        assert_eq!(workload.result_cpu.len(), 256);
        assert_eq!(workload.result_gpu.len(), 256);
        assert!(workload.result_cpu.is_zeroed());
        assert!(workload.result_gpu.is_zeroed());
    }

    #[test]
    fn test_seeded_generator_is_deterministic() {
        let dimension = Dimension::new(8).unwrap();
        let first = WorkloadGenerator::from_seed(42).generate(dimension);
        let second = WorkloadGenerator::from_seed(42).generate(dimension);

        assert_eq!(first.a, second.a);
        assert_eq!(first.b, second.b);
        assert_ne!(first.a, first.b);
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let dimension = Dimension::new(2).unwrap();
        assert!(Matrix::from_vec(dimension, vec![1.0; 3]).is_err());

        let matrix = Matrix::from_vec(dimension, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(matrix.get(1, 0), 3.0);
    }

    #[test]
    fn test_from_inputs_requires_matching_dimensions() {
        let a = Matrix::zeros(Dimension::new(2).unwrap());
        let b = Matrix::zeros(Dimension::new(3).unwrap());
        assert!(Workload::from_inputs(a, b).is_err());
    }
}
