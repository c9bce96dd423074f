//! Scripted runtime for exercising orchestration without real drivers.
//!
//! Platforms are declared up front, each with a list of devices and optional
//! injected failures. Every call the host makes is appended to a shared
//! [`MockLog`] so tests can assert what was attempted, and in which order.

use std::sync::{Arc, Mutex};

use crate::api::{BuildFailure, ComputeApi, Enumerated};
use crate::info::{DeviceCapabilities, DeviceType, PlatformProfile};
use crate::{BufferView, ComputeError};

#[derive(Debug, Clone, PartialEq)]
pub struct MockDevice {
    pub name: String,
    pub available: bool,
    pub compiler_available: bool,
    pub compute_units: u32,
}

impl MockDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), available: true, compiler_available: true, compute_units: 4 }
    }

    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    #[must_use]
    pub fn without_compiler(mut self) -> Self {
        self.compiler_available = false;
        self
    }

    fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities {
            device_type: DeviceType::Gpu,
            name: self.name.clone(),
            vendor: "Mock".to_string(),
            profile: "FULL_PROFILE".to_string(),
            version: "1.0".to_string(),
            max_compute_units: self.compute_units,
            max_clock_frequency: 1000,
            max_memory: 1 << 30,
            il_versions: vec!["SPIR-V_1.2".to_string()],
            available: self.available,
            compiler_available: self.compiler_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockPlatform {
    pub name: String,
    pub devices: Vec<MockDevice>,
    pub fail_context: bool,
    pub fail_queue: bool,
    /// Build log reported for every device when set.
    pub fail_build: Option<String>,
    pub fail_dispatch: bool,
}

impl MockPlatform {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            devices: Vec::new(),
            fail_context: false,
            fail_queue: false,
            fail_build: None,
            fail_dispatch: false,
        }
    }

    #[must_use]
    pub fn with_device(mut self, device: MockDevice) -> Self {
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn failing_context(mut self) -> Self {
        self.fail_context = true;
        self
    }

    #[must_use]
    pub fn failing_queue(mut self) -> Self {
        self.fail_queue = true;
        self
    }

    #[must_use]
    pub fn failing_dispatch(mut self) -> Self {
        self.fail_dispatch = true;
        self
    }

    #[must_use]
    pub fn failing_build(mut self, log: impl Into<String>) -> Self {
        self.fail_build = Some(log.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Enumerate,
    CreateContext { platform: String, devices: Vec<String> },
    CreateQueue { platform: String, device: String },
    Build { platform: String, ok: bool },
    Dispatch { platform: String, workgroups: [u32; 3] },
}

/// Call history shared between a [`MockApi`] and the test that owns it.
#[derive(Debug, Default)]
pub struct MockLog {
    events: Mutex<Vec<MockEvent>>,
}

impl MockLog {
    fn push(&self, event: MockEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn builds(&self) -> Vec<(String, bool)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                MockEvent::Build { platform, ok } => Some((platform, ok)),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct MockContext {
    platform: usize,
}

#[derive(Debug)]
pub struct MockQueue {
    platform: usize,
}

#[derive(Debug)]
pub struct MockKernel {
    platform: usize,
}

pub struct MockApi {
    platforms: Vec<MockPlatform>,
    log: Arc<MockLog>,
}

impl MockApi {
    #[must_use]
    pub fn new(platforms: Vec<MockPlatform>) -> Self {
        Self { platforms, log: Arc::default() }
    }

    #[must_use]
    pub fn log(&self) -> Arc<MockLog> {
        Arc::clone(&self.log)
    }

    fn platform_name(&self, index: usize) -> String {
        self.platforms.get(index).map(|p| p.name.clone()).unwrap_or_default()
    }
}

impl ComputeApi for MockApi {
    type Platform = usize;
    type Device = (usize, String);
    type Context = MockContext;
    type Queue = MockQueue;
    type Kernel = MockKernel;

    fn name(&self) -> &str {
        "mock"
    }

    fn enumerate(&mut self) -> Result<Vec<Enumerated<usize, (usize, String)>>, ComputeError> {
        self.log.push(MockEvent::Enumerate);
        Ok(self
            .platforms
            .iter()
            .enumerate()
            .map(|(index, platform)| Enumerated {
                profile: PlatformProfile {
                    name: platform.name.clone(),
                    vendor: "Mock".to_string(),
                    profile: "FULL_PROFILE".to_string(),
                    version: "1.0".to_string(),
                },
                platform: index,
                devices: platform
                    .devices
                    .iter()
                    .map(|d| (d.capabilities(), (index, d.name.clone())))
                    .collect(),
            })
            .collect())
    }

    fn create_context(
        &mut self,
        platform: &usize,
        devices: &[&(usize, String)],
    ) -> Result<MockContext, ComputeError> {
        let name = self.platform_name(*platform);
        self.log.push(MockEvent::CreateContext {
            platform: name.clone(),
            devices: devices.iter().map(|(_, d)| d.clone()).collect(),
        });
        if devices.iter().any(|(owner, _)| owner != platform) {
            let reason = format!("{name}: devices span several platforms");
            return Err(ComputeError::ContextCreation(reason));
        }
        match self.platforms.get(*platform) {
            Some(p) if p.fail_context => {
                Err(ComputeError::ContextCreation(format!("{name}: injected failure")))
            }
            Some(_) => Ok(MockContext { platform: *platform }),
            None => Err(ComputeError::ContextCreation(format!("no platform #{platform}"))),
        }
    }

    fn create_queue(
        &mut self,
        context: &MockContext,
        device: &(usize, String),
    ) -> Result<MockQueue, ComputeError> {
        let name = self.platform_name(context.platform);
        self.log.push(MockEvent::CreateQueue { platform: name.clone(), device: device.1.clone() });
        if self.platforms.get(context.platform).is_some_and(|p| p.fail_queue) {
            let reason = format!("{name}/{}: injected failure", device.1);
            return Err(ComputeError::QueueCreation(reason));
        }
        Ok(MockQueue { platform: context.platform })
    }

    fn build(
        &mut self,
        context: &MockContext,
        devices: &[&(usize, String)],
        _source: &str,
    ) -> Result<MockKernel, BuildFailure> {
        let name = self.platform_name(context.platform);
        let failure = self.platforms.get(context.platform).and_then(|p| p.fail_build.clone());
        self.log.push(MockEvent::Build { platform: name.clone(), ok: failure.is_none() });
        match failure {
            Some(log) => {
                let failure = BuildFailure::new(format!("{name}: build failed"));
                Err(devices.iter().fold(failure, |f, (_, d)| f.with_log(d.clone(), log.clone())))
            }
            None => Ok(MockKernel { platform: context.platform }),
        }
    }

    fn executes_kernels(&self) -> bool {
        true
    }

    fn dispatch(
        &self,
        kernel: &MockKernel,
        queue: &MockQueue,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        if kernel.platform != queue.platform {
            let reason = "kernel and queue belong to different platforms".to_string();
            return Err(ComputeError::Dispatch(reason));
        }
        let name = self.platform_name(kernel.platform);
        self.log.push(MockEvent::Dispatch { platform: name.clone(), workgroups });
        if self.platforms.get(kernel.platform).is_some_and(|p| p.fail_dispatch) {
            return Err(ComputeError::Dispatch(format!("{name}: injected failure")));
        }
        Ok(binds
            .iter()
            .filter(|b| b.kind.is_writable())
            .map(|b| vec![0u8; b.len_bytes()])
            .collect())
    }
}
