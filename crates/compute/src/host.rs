//! Per-runtime bookkeeping shared by every [`ComputeApi`].
//!
//! A [`Host`] owns all native resources of one runtime in UUID-keyed maps:
//! platforms, devices, contexts, command queues and kernels. Dropping the host
//! releases all of them.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, error, trace, warn};
use uuid::Uuid;

use crate::api::ComputeApi;
use crate::ids::IdGenerator;
use crate::info::{DeviceCapabilities, DeviceInfo, HostInfo, PlatformInfo};
use crate::{BufferView, ComputeError};

/// Result of one setup step for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub platform: Uuid,
    /// The created context (initialize) or kernel (compile) on success.
    pub result: Result<Uuid, ComputeError>,
}

impl Outcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Logical OR over per-platform outcomes.
#[must_use]
pub fn any_succeeded(outcomes: &[Outcome]) -> bool {
    outcomes.iter().fold(false, |acc, outcome| acc | outcome.is_ok())
}

/// Object safe view of a runtime used by the [`crate::Orchestrator`].
pub trait Host: Send + Sync {
    fn name(&self) -> &str;

    /// Enumerates platforms and devices, assigning identifiers from `ids`.
    fn info(&mut self, ids: &mut IdGenerator) -> HostInfo;

    /// Groups `devices` by platform and creates one context per group and one
    /// queue per device. Produces one outcome per platform group.
    fn initialize(&mut self, devices: &[Uuid], ids: &mut IdGenerator) -> Vec<Outcome>;

    /// Builds `source` on each listed platform. Produces one outcome per platform.
    fn compile(&mut self, platforms: &[Uuid], source: &str, ids: &mut IdGenerator) -> Vec<Outcome>;

    fn executes_kernels(&self) -> bool;

    /// Runs the compiled kernel of `platform` on its first queue.
    fn dispatch(
        &self,
        platform: Uuid,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError>;
}

struct PlatformRecord<A: ComputeApi> {
    native: A::Platform,
    devices: Vec<Uuid>,
    context: Option<Uuid>,
}

struct DeviceRecord<A: ComputeApi> {
    native: A::Device,
    platform: Uuid,
    context: Option<Uuid>,
    queue: Option<Uuid>,
    capabilities: DeviceCapabilities,
}

struct ContextRecord<A: ComputeApi> {
    native: A::Context,
    platform: Uuid,
    devices: Vec<Uuid>,
    queues: Vec<Uuid>,
    kernel: Option<Uuid>,
}

struct QueueRecord<A: ComputeApi> {
    native: A::Queue,
    context: Uuid,
    device: Uuid,
}

struct KernelRecord<A: ComputeApi> {
    native: A::Kernel,
    context: Uuid,
}

/// [`Host`] implementation over any [`ComputeApi`].
pub struct ApiHost<A: ComputeApi> {
    api: A,
    platforms: HashMap<Uuid, PlatformRecord<A>>,
    devices: HashMap<Uuid, DeviceRecord<A>>,
    contexts: HashMap<Uuid, ContextRecord<A>>,
    queues: HashMap<Uuid, QueueRecord<A>>,
    kernels: HashMap<Uuid, KernelRecord<A>>,
}

impl<A: ComputeApi> ApiHost<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            platforms: HashMap::new(),
            devices: HashMap::new(),
            contexts: HashMap::new(),
            queues: HashMap::new(),
            kernels: HashMap::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }

    #[must_use]
    pub fn kernel_count(&self) -> usize {
        self.kernels.len()
    }

    /// Context owning `device`, if it was initialized.
    #[must_use]
    pub fn device_context(&self, device: Uuid) -> Option<Uuid> {
        self.devices.get(&device).and_then(|d| d.context)
    }

    /// Queue bound to `device`, if it was initialized.
    #[must_use]
    pub fn device_queue(&self, device: Uuid) -> Option<Uuid> {
        self.devices.get(&device).and_then(|d| d.queue)
    }

    /// `(context, device)` pair a queue is bound to.
    #[must_use]
    pub fn queue_binding(&self, queue: Uuid) -> Option<(Uuid, Uuid)> {
        self.queues.get(&queue).map(|q| (q.context, q.device))
    }

    /// Context a kernel was built against.
    #[must_use]
    pub fn kernel_context(&self, kernel: Uuid) -> Option<Uuid> {
        self.kernels.get(&kernel).map(|k| k.context)
    }

    /// Platform a context was created from.
    #[must_use]
    pub fn context_platform(&self, context: Uuid) -> Option<Uuid> {
        self.contexts.get(&context).map(|c| c.platform)
    }

    /// Drops the context of `platform` along with its queues and kernel.
    fn release_context(&mut self, platform: Uuid) {
        let Some(context_id) = self.platforms.get_mut(&platform).and_then(|p| p.context.take())
        else {
            return;
        };
        if let Some(context) = self.contexts.remove(&context_id) {
            for queue in &context.queues {
                self.queues.remove(queue);
            }
            if let Some(kernel) = context.kernel {
                self.kernels.remove(&kernel);
            }
            for device in &context.devices {
                if let Some(record) = self.devices.get_mut(device) {
                    record.context = None;
                    record.queue = None;
                }
            }
            trace!(target: "tpm::host", "Released context {context_id} of platform {platform}");
        }
    }

    /// Drops every record, so a new enumeration starts from an empty host.
    fn release_all(&mut self) {
        let platforms: Vec<Uuid> = self.platforms.keys().copied().collect();
        for platform in platforms {
            self.release_context(platform);
        }
        self.kernels.clear();
        self.queues.clear();
        self.contexts.clear();
        self.platforms.clear();
        self.devices.clear();
    }

    fn initialize_platform(
        &mut self,
        platform: Uuid,
        devices: &[Uuid],
        ids: &mut IdGenerator,
    ) -> Result<Uuid, ComputeError> {
        self.release_context(platform);

        let platform_record =
            self.platforms.get(&platform).ok_or(ComputeError::UnknownPlatform(platform))?;
        let natives: Vec<&A::Device> = devices
            .iter()
            .filter_map(|id| self.devices.get(id).map(|d| &d.native))
            .collect();
        let native_context = self.api.create_context(&platform_record.native, &natives)?;

        let context_id = ids.random();
        trace!(
            target: "tpm::host",
            "Context({context_id}) {{platform={platform}, devices={devices:?}}}"
        );

        let mut queues = Vec::new();
        for &device in devices {
            let Some(record) = self.devices.get(&device) else { continue };
            match self.api.create_queue(&native_context, &record.native) {
                Ok(native_queue) => {
                    let queue_id = ids.random();
                    trace!(
                        target: "tpm::host",
                        "CommandQueue({queue_id}) {{context={context_id}, device={device}}}"
                    );
                    self.queues.insert(
                        queue_id,
                        QueueRecord { native: native_queue, context: context_id, device },
                    );
                    queues.push(queue_id);
                    if let Some(record) = self.devices.get_mut(&device) {
                        record.context = Some(context_id);
                        record.queue = Some(queue_id);
                    }
                }
                Err(e) => {
                    warn!(
                        target: "tpm::host",
                        "Failed to create command queue for device {device}: {e}"
                    );
                }
            }
        }

        if queues.is_empty() {
            return Err(ComputeError::QueueCreation(format!(
                "no queue could be created on platform {platform}"
            )));
        }

        self.contexts.insert(
            context_id,
            ContextRecord {
                native: native_context,
                platform,
                devices: devices.to_vec(),
                queues,
                kernel: None,
            },
        );
        if let Some(record) = self.platforms.get_mut(&platform) {
            record.context = Some(context_id);
        }
        Ok(context_id)
    }

    fn compile_platform(
        &mut self,
        platform: Uuid,
        source: &str,
        ids: &mut IdGenerator,
    ) -> Result<Uuid, ComputeError> {
        let context_id = self
            .platforms
            .get(&platform)
            .ok_or(ComputeError::UnknownPlatform(platform))?
            .context
            .ok_or(ComputeError::NotInitialized(platform))?;
        let context = self.contexts.get(&context_id).ok_or(ComputeError::NotInitialized(platform))?;
        let natives: Vec<&A::Device> = context
            .devices
            .iter()
            .filter_map(|id| self.devices.get(id).map(|d| &d.native))
            .collect();

        let native_kernel = match self.api.build(&context.native, &natives, source) {
            Ok(kernel) => kernel,
            Err(failure) => {
                error!(
                    target: "tpm::host",
                    "Failed to compile kernel for context {context_id}: {}",
                    failure.reason
                );
                for (name, log) in &failure.device_logs {
                    let device = context.devices.iter().find(|id| {
                        self.devices.get(id).is_some_and(|d| &d.capabilities.name == name)
                    });
                    match device {
                        Some(id) => error!(target: "tpm::host", "{name} ({id}): {log}"),
                        None => error!(target: "tpm::host", "{name}: {log}"),
                    }
                }
                return Err(ComputeError::Build(failure.reason));
            }
        };

        let kernel_id = ids.random();
        trace!(
            target: "tpm::host",
            "Kernel({kernel_id}) {{context={context_id}, source=\"{}\"}}",
            source.replace('\n', " ")
        );
        let replaced =
            self.contexts.get_mut(&context_id).and_then(|c| c.kernel.replace(kernel_id));
        if let Some(old) = replaced {
            self.kernels.remove(&old);
        }
        self.kernels.insert(kernel_id, KernelRecord { native: native_kernel, context: context_id });
        Ok(kernel_id)
    }
}

impl<A: ComputeApi> Host for ApiHost<A> {
    fn name(&self) -> &str {
        self.api.name()
    }

    fn info(&mut self, ids: &mut IdGenerator) -> HostInfo {
        self.release_all();
        let mut response = HostInfo::default();
        let enumerated = match self.api.enumerate() {
            Ok(platforms) => platforms,
            Err(e) => {
                warn!(target: "tpm::host", "{}: platform enumeration failed: {e}", self.api.name());
                return response;
            }
        };
        if enumerated.is_empty() {
            warn!(target: "tpm::host", "{}: no platforms found", self.api.name());
            return response;
        }

        for (index, platform) in enumerated.into_iter().enumerate() {
            let profile = &platform.profile;
            let platform_id = ids.named(&format!("{}/{index}/{}", self.api.name(), profile.name));
            trace!(
                target: "tpm::host",
                "Platform({platform_id}) {{name={}, profile={}, vendor={}, version={}}}",
                profile.name,
                profile.profile,
                profile.vendor,
                profile.version
            );
            if platform.devices.is_empty() {
                warn!(target: "tpm::host", "Platform ({}) has no devices", platform.profile.name);
            }

            let mut info =
                PlatformInfo { uuid: platform_id, profile: platform.profile, devices: Vec::new() };
            let mut device_ids = Vec::new();
            for (device_index, (capabilities, native)) in platform.devices.into_iter().enumerate() {
                let device_id =
                    ids.named(&format!("{platform_id}/{device_index}/{}", capabilities.name));
                trace!(
                    target: "tpm::host",
                    concat!(
                        "Device({}) {{type={}, max_compute_units={}, max_clock_frequency={}, ",
                        "max_memory={}, il_version={:?}, available={}, compiler_available={}, ",
                        "name={}, vendor={}}}"
                    ),
                    device_id,
                    capabilities.device_type,
                    capabilities.max_compute_units,
                    capabilities.max_clock_frequency,
                    capabilities.max_memory,
                    capabilities.il_versions,
                    capabilities.available,
                    capabilities.compiler_available,
                    capabilities.name,
                    capabilities.vendor
                );
                self.devices.insert(
                    device_id,
                    DeviceRecord {
                        native,
                        platform: platform_id,
                        context: None,
                        queue: None,
                        capabilities: capabilities.clone(),
                    },
                );
                device_ids.push(device_id);
                info.devices.push(DeviceInfo {
                    uuid: device_id,
                    platform: platform_id,
                    capabilities,
                });
            }

            self.platforms.insert(
                platform_id,
                PlatformRecord { native: platform.platform, devices: device_ids, context: None },
            );
            response.platforms.push(info);
        }
        response
    }

    fn initialize(&mut self, devices: &[Uuid], ids: &mut IdGenerator) -> Vec<Outcome> {
        let mut groups: BTreeMap<Uuid, Vec<Uuid>> = BTreeMap::new();
        for &device in devices {
            match self.devices.get(&device) {
                Some(record) if record.capabilities.is_usable() => {
                    groups.entry(record.platform).or_default().push(device);
                }
                Some(_) => debug!(target: "tpm::host", "Ignoring unavailable device {device}"),
                None => warn!(target: "tpm::host", "Ignoring unknown device {device}"),
            }
        }

        let mut outcomes = Vec::with_capacity(groups.len());
        for (platform, members) in groups {
            let result = self.initialize_platform(platform, &members, ids);
            if let Err(e) = &result {
                error!(target: "tpm::host", "Failed to initialize platform {platform}: {e}");
            }
            outcomes.push(Outcome { platform, result });
        }
        outcomes
    }

    fn compile(&mut self, platforms: &[Uuid], source: &str, ids: &mut IdGenerator) -> Vec<Outcome> {
        platforms
            .iter()
            .map(|&platform| Outcome {
                platform,
                result: self.compile_platform(platform, source, ids),
            })
            .collect()
    }

    fn executes_kernels(&self) -> bool {
        self.api.executes_kernels()
    }

    fn dispatch(
        &self,
        platform: Uuid,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        if !self.api.executes_kernels() {
            return Err(ComputeError::DispatchUnsupported(self.api.name().to_string()));
        }
        let context_id = self
            .platforms
            .get(&platform)
            .ok_or(ComputeError::UnknownPlatform(platform))?
            .context
            .ok_or(ComputeError::NotInitialized(platform))?;
        let context = self.contexts.get(&context_id).ok_or(ComputeError::NotInitialized(platform))?;
        let kernel = context
            .kernel
            .and_then(|k| self.kernels.get(&k))
            .ok_or(ComputeError::NotCompiled(platform))?;
        let queue = context
            .queues
            .first()
            .and_then(|q| self.queues.get(q))
            .ok_or(ComputeError::NotInitialized(platform))?;
        for bind in binds {
            bind.validate()?;
        }
        self.api.dispatch(&kernel.native, &queue.native, binds, workgroups)
    }
}
