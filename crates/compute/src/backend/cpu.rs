//! The host processor exposed as a single compute platform.
//!
//! Building a kernel runs the WGSL front end and validator so source errors
//! surface during setup like on any other platform. The renderer executes the
//! equivalent native code path itself, so [`CpuApi`] never runs kernels.

use sysinfo::System;
use tracing::debug;

use crate::api::{BuildFailure, ComputeApi, Enumerated};
use crate::info::{DeviceCapabilities, DeviceType, PlatformProfile};
use crate::kernel::{validate_wgsl, ENTRY_POINT};
use crate::{BufferView, ComputeError};

#[derive(Debug, Clone)]
pub struct CpuDevice {
    pub name: String,
}

/// Validated module kept for introspection.
#[derive(Debug)]
pub struct CpuKernel {
    pub module: naga::Module,
}

#[derive(Debug, Default)]
pub struct CpuApi {
    _private: (),
}

impl CpuApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn capabilities() -> DeviceCapabilities {
        let system = System::new_all();
        let cpus = system.cpus();
        let (name, vendor, frequency) = cpus
            .first()
            .map(|cpu| {
                (cpu.brand().trim().to_string(), cpu.vendor_id().to_string(), cpu.frequency())
            })
            .unwrap_or_else(|| ("Unknown CPU".to_string(), String::new(), 0));
        let compute_units = std::thread::available_parallelism()
            .map_or(cpus.len().max(1), std::num::NonZeroUsize::get);

        DeviceCapabilities {
            device_type: DeviceType::Cpu,
            name,
            vendor,
            profile: "FULL_PROFILE".to_string(),
            version: System::os_version().unwrap_or_default(),
            max_compute_units: u32::try_from(compute_units).unwrap_or(u32::MAX),
            max_clock_frequency: u32::try_from(frequency).unwrap_or(u32::MAX),
            max_memory: system.total_memory(),
            il_versions: vec!["WGSL".to_string()],
            available: true,
            compiler_available: true,
        }
    }
}

impl ComputeApi for CpuApi {
    type Platform = ();
    type Device = CpuDevice;
    type Context = Vec<String>;
    type Queue = ();
    type Kernel = CpuKernel;

    fn name(&self) -> &str {
        "cpu"
    }

    fn enumerate(&mut self) -> Result<Vec<Enumerated<(), CpuDevice>>, ComputeError> {
        let capabilities = Self::capabilities();
        let device = CpuDevice { name: capabilities.name.clone() };
        Ok(vec![Enumerated {
            profile: PlatformProfile {
                name: "Native CPU".to_string(),
                vendor: capabilities.vendor.clone(),
                profile: "FULL_PROFILE".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            platform: (),
            devices: vec![(capabilities, device)],
        }])
    }

    fn create_context(
        &mut self,
        _platform: &(),
        devices: &[&CpuDevice],
    ) -> Result<Vec<String>, ComputeError> {
        if devices.is_empty() {
            return Err(ComputeError::ContextCreation("no devices".to_string()));
        }
        Ok(devices.iter().map(|d| d.name.clone()).collect())
    }

    fn create_queue(
        &mut self,
        _context: &Vec<String>,
        _device: &CpuDevice,
    ) -> Result<(), ComputeError> {
        Ok(())
    }

    fn build(
        &mut self,
        _context: &Vec<String>,
        devices: &[&CpuDevice],
        source: &str,
    ) -> Result<CpuKernel, BuildFailure> {
        match validate_wgsl(source, ENTRY_POINT) {
            Ok(module) => {
                debug!(
                    target: "tpm::host",
                    "cpu: validated kernel with {} entry points",
                    module.entry_points.len()
                );
                Ok(CpuKernel { module })
            }
            Err(log) => {
                let failure = BuildFailure::new("WGSL validation failed");
                Err(devices.iter().fold(failure, |f, d| f.with_log(d.name.clone(), log.clone())))
            }
        }
    }

    fn dispatch(
        &self,
        _kernel: &CpuKernel,
        _queue: &(),
        _binds: &[BufferView],
        _workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        Err(ComputeError::DispatchUnsupported(self.name().to_string()))
    }
}
