//! OpenCL backend built on the `ocl` crate

use super::{BufferAccess, ComputeBackend};
use crate::config::{DeviceConfig, DeviceKind};
use crate::error::{DeviceBuildLog, HarnessError, CL_BUILD_PROGRAM_FAILURE};
use ocl::flags::MemFlags;
use ocl::{Buffer, Context, Device, DeviceType, Kernel, Platform, Program, Queue};
use tracing::{debug, info};

/// Status used when `ocl` reports an error without an API status
const CL_UNKNOWN_FAILURE: i32 = -9999;

fn status_code(err: &ocl::Error) -> Option<i32> {
    err.api_status().map(|status| status as i32)
}

fn device_error(operation: &str, err: ocl::Error) -> HarnessError {
    let code = status_code(&err).unwrap_or(CL_UNKNOWN_FAILURE);
    HarnessError::device_operation(operation, code, err.to_string())
}

/// One OpenCL device with its context and in-order queue
pub struct OpenClBackend {
    device: Device,
    context: Context,
    queue: Queue,
    name: String,
}

impl OpenClBackend {
    /// Select the configured platform and device and create a queue on it
    pub fn select(config: &DeviceConfig) -> Result<Self, HarnessError> {
        let platforms = Platform::list();
        let platform = platforms
            .get(config.platform_index)
            .cloned()
            .ok_or_else(|| HarnessError::DeviceUnavailable {
                reason: format!(
                    "OpenCL platform index {} not found. Total platforms: {}",
                    config.platform_index,
                    platforms.len()
                ),
            })?;

        let device_type = match config.device_type {
            DeviceKind::Default => DeviceType::DEFAULT,
            DeviceKind::Gpu => DeviceType::GPU,
            DeviceKind::Cpu => DeviceType::CPU,
            DeviceKind::Accelerator => DeviceType::ACCELERATOR,
            DeviceKind::All => DeviceType::ALL,
        };

        let devices = Device::list(platform, Some(device_type)).map_err(|e| {
            HarnessError::DeviceUnavailable {
                reason: format!("Failed to list {} devices: {e}", config.device_type),
            }
        })?;
        let device = devices
            .get(config.device_index)
            .cloned()
            .ok_or_else(|| HarnessError::DeviceUnavailable {
                reason: format!(
                    "OpenCL {} device index {} not found. Total devices: {}",
                    config.device_type,
                    config.device_index,
                    devices.len()
                ),
            })?;

        let name = device
            .name()
            .map_err(|e| device_error("query device name", e))?;
        debug!("Selected OpenCL device {} on platform {}", name, config.platform_index);

        let context = Context::builder()
            .platform(platform)
            .devices(device)
            .build()
            .map_err(|e| device_error("create context", e))?;
        let queue =
            Queue::new(&context, device, None).map_err(|e| device_error("create queue", e))?;

        info!("OpenCL device ready: {}", name);
        Ok(Self {
            device,
            context,
            queue,
            name,
        })
    }
}

impl ComputeBackend for OpenClBackend {
    type Program = Program;
    type Kernel = Kernel;
    type Buffer = Buffer<f64>;

    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn build_program(&self, source: &str) -> Result<Program, HarnessError> {
        Program::builder()
            .src(source)
            .devices(self.device)
            .build(&self.context)
            .map_err(|e| HarnessError::BuildFailure {
                code: status_code(&e).unwrap_or(CL_BUILD_PROGRAM_FAILURE),
                logs: vec![DeviceBuildLog {
                    device: self.name.clone(),
                    log: e.to_string(),
                }],
            })
    }

    fn bind_kernel(&self, program: &Program, entry_point: &str) -> Result<Kernel, HarnessError> {
        Kernel::builder()
            .program(program)
            .name(entry_point)
            .queue(self.queue.clone())
            .arg_named("a", None::<&Buffer<f64>>)
            .arg_named("b", None::<&Buffer<f64>>)
            .arg_named("result", None::<&Buffer<f64>>)
            .arg_named("n", 0i32)
            .build()
            .map_err(|e| HarnessError::kernel_binding(entry_point, status_code(&e), e.to_string()))
    }

    fn create_buffer(&self, len: usize, access: BufferAccess) -> Result<Buffer<f64>, HarnessError> {
        let flags = match access {
            BufferAccess::ReadOnly => MemFlags::new().read_only(),
            BufferAccess::ReadWrite => MemFlags::new().read_write(),
        };
        Buffer::<f64>::builder()
            .queue(self.queue.clone())
            .flags(flags)
            .len(len)
            .build()
            .map_err(|e| device_error("create buffer", e))
    }

    fn write_buffer(&self, buffer: &Buffer<f64>, data: &[f64]) -> Result<(), HarnessError> {
        buffer
            .write(data)
            .enq()
            .map_err(|e| device_error("write buffer", e))
    }

    fn read_buffer(&self, buffer: &Buffer<f64>, data: &mut [f64]) -> Result<(), HarnessError> {
        buffer
            .read(data)
            .enq()
            .map_err(|e| device_error("read buffer", e))
    }

    fn enqueue_kernel(
        &self,
        kernel: &Kernel,
        a: &Buffer<f64>,
        b: &Buffer<f64>,
        result: &Buffer<f64>,
        dimension: i32,
        global_work_size: usize,
    ) -> Result<(), HarnessError> {
        kernel
            .set_arg("a", a)
            .and_then(|_| kernel.set_arg("b", b))
            .and_then(|_| kernel.set_arg("result", result))
            .and_then(|_| kernel.set_arg("n", dimension))
            .map_err(|e| device_error("set kernel arguments", e))?;

        // SAFETY: all four arguments are set and every buffer holds
        // `global_work_size` elements, the largest index the kernel touches.
        unsafe {
            kernel
                .cmd()
                .global_work_size(global_work_size)
                .enq()
                .map_err(|e| device_error("enqueue kernel", e))
        }
    }

    fn finish(&self) -> Result<(), HarnessError> {
        self.queue
            .finish()
            .map_err(|e| device_error("finish queue", e))
    }
}
