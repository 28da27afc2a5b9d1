//! Host emulation of a compute device
//!
//! A test double for [`ComputeBackend`]. Buffers live in host memory and
//! "compilation" is a front-end check of the OpenCL C source: comments,
//! delimiter balance, operators missing their right-hand operand, and the
//! `__kernel void NAME` declarations. The kernel body is never executed.
//! Instead, each entry point runs a Rust work-item function registered with
//! [`HostBackend::with_kernel`], so results reflect that function and not
//! the OpenCL source.

use super::{BufferAccess, ComputeBackend, KERNEL_ENTRY_POINT};
use crate::error::{
    DeviceBuildLog, HarnessError, CL_BUILD_PROGRAM_FAILURE, CL_INVALID_KERNEL_ARGS,
    CL_INVALID_KERNEL_NAME, CL_INVALID_VALUE, CL_INVALID_WORK_DIMENSION,
};
use std::cell::{Cell, RefCell};
use tracing::debug;

/// Device name reported by [`HostBackend::new`]
pub const HOST_DEVICE_NAME: &str = "Host emulation device";

/// Computes output element `gid` from the row-major N×N inputs
pub type WorkItemFn = fn(gid: usize, a: &[f64], b: &[f64], n: usize) -> f64;

/// Rust rendition of the shipped `matmul` kernel: row `gid / N`, column
/// `gid % N`, k-loop accumulation
pub fn matmul_work_item(gid: usize, a: &[f64], b: &[f64], n: usize) -> f64 {
    let row = gid / n;
    let col = gid % n;
    let mut acc = 0.0f64;
    for k in 0..n {
        acc += a[row * n + k] * b[k * n + col];
    }
    acc
}

pub struct HostBackend {
    name: String,
    kernels: Vec<(String, WorkItemFn)>,
    allocations: Cell<usize>,
}

#[derive(Debug, Clone)]
pub struct HostProgram {
    entry_points: Vec<String>,
}

impl HostProgram {
    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }
}

#[derive(Debug, Clone)]
pub struct HostKernel {
    name: String,
    work_item: WorkItemFn,
}

impl HostKernel {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct HostBuffer {
    access: BufferAccess,
    data: RefCell<Vec<f64>>,
}

impl HostBuffer {
    pub fn access(&self) -> BufferAccess {
        self.access
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HostBackend {
    /// Emulated device with no work-item functions registered
    pub fn new() -> Self {
        Self::with_name(HOST_DEVICE_NAME)
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernels: Vec::new(),
            allocations: Cell::new(0),
        }
    }

    /// Emulated device that runs [`matmul_work_item`] for `matmul`
    pub fn matmul() -> Self {
        Self::new().with_kernel(KERNEL_ENTRY_POINT, matmul_work_item)
    }

    /// Register the function executed when `entry_point` is launched
    pub fn with_kernel(mut self, entry_point: impl Into<String>, work_item: WorkItemFn) -> Self {
        self.kernels.push((entry_point.into(), work_item));
        self
    }

    /// Number of buffers created so far
    pub fn allocated_buffers(&self) -> usize {
        self.allocations.get()
    }
}

impl ComputeBackend for HostBackend {
    type Program = HostProgram;
    type Kernel = HostKernel;
    type Buffer = HostBuffer;

    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn is_emulated(&self) -> bool {
        true
    }

    fn build_program(&self, source: &str) -> Result<HostProgram, HarnessError> {
        let scan = scan_source(source);
        if !scan.diagnostics.is_empty() {
            return Err(HarnessError::BuildFailure {
                code: CL_BUILD_PROGRAM_FAILURE,
                logs: vec![DeviceBuildLog {
                    device: self.name.clone(),
                    log: scan.diagnostics.join("\n"),
                }],
            });
        }

        debug!("Host program exposes kernels: {:?}", scan.entry_points);
        Ok(HostProgram {
            entry_points: scan.entry_points,
        })
    }

    fn bind_kernel(
        &self,
        program: &HostProgram,
        entry_point: &str,
    ) -> Result<HostKernel, HarnessError> {
        if !program.entry_points.iter().any(|name| name == entry_point) {
            return Err(HarnessError::kernel_binding(
                entry_point,
                Some(CL_INVALID_KERNEL_NAME),
                "entry point not declared in program",
            ));
        }

        let work_item = self
            .kernels
            .iter()
            .find(|(name, _)| name == entry_point)
            .map(|(_, work_item)| *work_item)
            .ok_or_else(|| {
                HarnessError::runtime(format!(
                    "{} has no work-item function registered for '{entry_point}'",
                    self.name
                ))
            })?;

        Ok(HostKernel {
            name: entry_point.to_string(),
            work_item,
        })
    }

    fn create_buffer(&self, len: usize, access: BufferAccess) -> Result<HostBuffer, HarnessError> {
        self.allocations.set(self.allocations.get() + 1);
        Ok(HostBuffer {
            access,
            data: RefCell::new(vec![0.0; len]),
        })
    }

    fn write_buffer(&self, buffer: &HostBuffer, data: &[f64]) -> Result<(), HarnessError> {
        let mut storage = buffer.data.borrow_mut();
        if storage.len() != data.len() {
            return Err(HarnessError::device_operation(
                "write buffer",
                CL_INVALID_VALUE,
                format!(
                    "host slice has {} elements, buffer holds {}",
                    data.len(),
                    storage.len()
                ),
            ));
        }
        storage.copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, buffer: &HostBuffer, data: &mut [f64]) -> Result<(), HarnessError> {
        let storage = buffer.data.borrow();
        if storage.len() != data.len() {
            return Err(HarnessError::device_operation(
                "read buffer",
                CL_INVALID_VALUE,
                format!(
                    "host slice has {} elements, buffer holds {}",
                    data.len(),
                    storage.len()
                ),
            ));
        }
        data.copy_from_slice(&storage);
        Ok(())
    }

    fn enqueue_kernel(
        &self,
        kernel: &HostKernel,
        a: &HostBuffer,
        b: &HostBuffer,
        result: &HostBuffer,
        dimension: i32,
        global_work_size: usize,
    ) -> Result<(), HarnessError> {
        let invalid_args = |message: String| {
            HarnessError::device_operation("enqueue kernel", CL_INVALID_KERNEL_ARGS, message)
        };

        if dimension <= 0 {
            return Err(invalid_args(format!("dimension {dimension} is not positive")));
        }
        let n = dimension as usize;
        let elements = n * n;

        if global_work_size == 0 || global_work_size > elements {
            return Err(HarnessError::device_operation(
                "enqueue kernel",
                CL_INVALID_WORK_DIMENSION,
                format!("global work size {global_work_size} outside 1..={elements}"),
            ));
        }
        if result.access != BufferAccess::ReadWrite {
            return Err(invalid_args("result buffer is read-only".to_string()));
        }
        if std::ptr::eq(a, result) || std::ptr::eq(b, result) {
            return Err(invalid_args("result buffer aliases an input".to_string()));
        }
        if a.len() < elements || b.len() < elements || result.len() < elements {
            return Err(invalid_args(format!(
                "buffers smaller than {elements} elements"
            )));
        }

        debug!(
            "Executing '{}' over {} work-items",
            kernel.name, global_work_size
        );

        let a = a.data.borrow();
        let b = b.data.borrow();
        let mut c = result.data.borrow_mut();
        for (gid, out) in c.iter_mut().take(global_work_size).enumerate() {
            *out = (kernel.work_item)(gid, &a, &b, n);
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), HarnessError> {
        // Kernels execute synchronously on enqueue.
        Ok(())
    }
}

struct SourceScan {
    entry_points: Vec<String>,
    diagnostics: Vec<String>,
}

/// Strip comments, check delimiters and operands, collect `__kernel` names
fn scan_source(source: &str) -> SourceScan {
    let mut diagnostics = Vec::new();
    let mut code = String::with_capacity(source.len());
    let mut stack: Vec<(char, usize)> = Vec::new();

    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut comment_start = None;

    while let Some(c) = chars.next() {
        if comment_start.is_some() {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                comment_start = None;
                code.push(' ');
            } else if c == '\n' {
                line += 1;
                code.push('\n');
            }
            continue;
        }

        match c {
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        code.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                comment_start = Some(line);
            }
            '\n' => {
                line += 1;
                code.push(c);
            }
            '(' | '[' | '{' => {
                stack.push((c, line));
                code.push(c);
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_line)) => diagnostics.push(format!(
                        "line {line}: error: '{c}' does not match '{open}' opened on line {open_line}"
                    )),
                    None => diagnostics.push(format!("line {line}: error: unexpected '{c}'")),
                }
                code.push(c);
            }
            _ => code.push(c),
        }
    }

    if let Some(start) = comment_start {
        diagnostics.push(format!("line {start}: error: unterminated /* comment"));
    }
    for (open, open_line) in stack {
        diagnostics.push(format!("line {open_line}: error: '{open}' is never closed"));
    }

    diagnostics.extend(missing_operands(&code));

    SourceScan {
        entry_points: kernel_names(&code),
        diagnostics,
    }
}

/// Flag `=`-family operators followed directly by `;`, `,` or a closer
///
/// `code` is comment-free; preprocessor lines are skipped.
fn missing_operands(code: &str) -> Vec<String> {
    let chars: Vec<char> = code.chars().collect();
    let mut diagnostics = Vec::new();
    let mut line = 1;
    let mut line_blank = true;
    let mut in_directive = false;

    for (index, &c) in chars.iter().enumerate() {
        match c {
            '\n' => {
                line += 1;
                line_blank = true;
                in_directive = false;
                continue;
            }
            '#' if line_blank => in_directive = true,
            '=' if !in_directive => {
                let next = chars[index + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, None | Some(';' | ',' | ')' | ']' | '}')) {
                    diagnostics.push(format!(
                        "line {line}: error: expected expression after '='"
                    ));
                }
            }
            _ => {}
        }
        if !c.is_whitespace() {
            line_blank = false;
        }
    }

    diagnostics
}

fn kernel_names(code: &str) -> Vec<String> {
    let tokens: Vec<&str> = code
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .collect();

    tokens
        .windows(3)
        .filter(|w| matches!(w[0], "__kernel" | "kernel") && w[1] == "void")
        .map(|w| w[2].to_string())
        .collect()
}
