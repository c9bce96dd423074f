//! [`ComputeApi`] over `wgpu` adapters.
//!
//! Each graphics backend (Vulkan, Metal, DX12, GL) reported by the instance is
//! one platform; its adapters are the devices. A context opens one logical
//! `wgpu::Device` per adapter, and the kernel is one compute pipeline per
//! device.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;
use wgpu::util::DeviceExt;

use crate::api::{BuildFailure, ComputeApi, Enumerated};
use crate::info::{DeviceCapabilities, DeviceType, PlatformProfile};
use crate::kernel::{validate_wgsl, ENTRY_POINT};
use crate::{BindingKind, BufferView, ComputeError};

pub struct GpuAdapter {
    index: usize,
    name: String,
    adapter: Arc<wgpu::Adapter>,
}

/// One opened adapter inside a context.
pub struct GpuMember {
    index: usize,
    name: String,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

pub struct GpuContext {
    members: Vec<GpuMember>,
}

pub struct GpuQueue {
    index: usize,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

pub struct GpuKernel {
    pipelines: Vec<(usize, wgpu::ComputePipeline)>,
}

pub struct WgpuApi {
    instance: wgpu::Instance,
}

impl Default for WgpuApi {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuApi {
    #[must_use]
    pub fn new() -> Self {
        let backends = wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all());
        let instance =
            wgpu::Instance::new(wgpu::InstanceDescriptor { backends, ..Default::default() });
        Self { instance }
    }

    fn capabilities(info: &wgpu::AdapterInfo, limits: &wgpu::Limits) -> DeviceCapabilities {
        let device_type = match info.device_type {
            wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu => DeviceType::Gpu,
            wgpu::DeviceType::Cpu => DeviceType::Cpu,
            wgpu::DeviceType::Other => DeviceType::Custom,
        };
        let mut il_versions = vec!["WGSL".to_string()];
        if info.backend == wgpu::Backend::Vulkan {
            il_versions.push("SPIR-V_1.0".to_string());
        }
        DeviceCapabilities {
            device_type,
            name: info.name.clone(),
            vendor: format!("{:#06x}", info.vendor),
            profile: format!("{:?}", info.backend),
            version: info.driver_info.clone(),
            max_compute_units: limits.max_compute_invocations_per_workgroup,
            max_clock_frequency: 0,
            max_memory: limits.max_buffer_size,
            il_versions,
            available: true,
            compiler_available: limits.max_compute_workgroups_per_dimension > 0,
        }
    }
}

impl ComputeApi for WgpuApi {
    type Platform = wgpu::Backend;
    type Device = GpuAdapter;
    type Context = GpuContext;
    type Queue = GpuQueue;
    type Kernel = GpuKernel;

    fn name(&self) -> &str {
        "wgpu"
    }

    fn enumerate(&mut self) -> Result<Vec<Enumerated<wgpu::Backend, GpuAdapter>>, ComputeError> {
        let mut by_backend: BTreeMap<String, Enumerated<wgpu::Backend, GpuAdapter>> =
            BTreeMap::new();
        let adapters = self.instance.enumerate_adapters(wgpu::Backends::all());
        for (index, adapter) in adapters.into_iter().enumerate() {
            let info = adapter.get_info();
            let capabilities = Self::capabilities(&info, &adapter.limits());
            let entry =
                by_backend.entry(format!("{:?}", info.backend)).or_insert_with(|| Enumerated {
                    profile: PlatformProfile {
                        name: format!("wgpu {:?}", info.backend),
                        vendor: capabilities.vendor.clone(),
                        profile: "WGSL".to_string(),
                        version: info.driver.clone(),
                    },
                    platform: info.backend,
                    devices: Vec::new(),
                });
            let device = GpuAdapter { index, name: info.name.clone(), adapter: Arc::new(adapter) };
            entry.devices.push((capabilities, device));
        }
        Ok(by_backend.into_values().collect())
    }

    fn create_context(
        &mut self,
        _platform: &wgpu::Backend,
        devices: &[&GpuAdapter],
    ) -> Result<GpuContext, ComputeError> {
        let mut members = Vec::with_capacity(devices.len());
        for adapter in devices {
            let (device, queue) = pollster::block_on(adapter.adapter.request_device(
                &wgpu::DeviceDescriptor {
                    label: Some(&adapter.name),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.adapter.limits(),
                },
                None,
            ))
            .map_err(|e| ComputeError::ContextCreation(format!("{}: {e}", adapter.name)))?;
            members.push(GpuMember {
                index: adapter.index,
                name: adapter.name.clone(),
                device: Arc::new(device),
                queue: Arc::new(queue),
            });
        }
        Ok(GpuContext { members })
    }

    fn create_queue(
        &mut self,
        context: &GpuContext,
        device: &GpuAdapter,
    ) -> Result<GpuQueue, ComputeError> {
        context
            .members
            .iter()
            .find(|m| m.index == device.index)
            .map(|m| GpuQueue {
                index: m.index,
                device: Arc::clone(&m.device),
                queue: Arc::clone(&m.queue),
            })
            .ok_or_else(|| {
                ComputeError::QueueCreation(format!("{} is not part of the context", device.name))
            })
    }

    fn build(
        &mut self,
        context: &GpuContext,
        _devices: &[&GpuAdapter],
        source: &str,
    ) -> Result<GpuKernel, BuildFailure> {
        if let Err(log) = validate_wgsl(source, ENTRY_POINT) {
            let failure = BuildFailure::new("WGSL validation failed");
            return Err(context
                .members
                .iter()
                .fold(failure, |f, m| f.with_log(m.name.clone(), log.clone())));
        }

        let mut pipelines = Vec::with_capacity(context.members.len());
        let mut failure: Option<BuildFailure> = None;
        for member in &context.members {
            member.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = member.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("tpm"),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let pipeline = member.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("tpm pipeline"),
                layout: None,
                module: &module,
                entry_point: ENTRY_POINT,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            });
            match pollster::block_on(member.device.pop_error_scope()) {
                None => {
                    trace!(target: "tpm::host", "wgpu: built pipeline on {}", member.name);
                    pipelines.push((member.index, pipeline));
                }
                Some(e) => {
                    let f = failure
                        .take()
                        .unwrap_or_else(|| BuildFailure::new("pipeline creation failed"));
                    failure = Some(f.with_log(member.name.clone(), e.to_string()));
                }
            }
        }
        match failure {
            Some(f) => Err(f),
            None => Ok(GpuKernel { pipelines }),
        }
    }

    fn executes_kernels(&self) -> bool {
        true
    }

    #[allow(clippy::cast_possible_truncation)]
    fn dispatch(
        &self,
        kernel: &GpuKernel,
        queue: &GpuQueue,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        let pipeline = kernel
            .pipelines
            .iter()
            .find(|(index, _)| *index == queue.index)
            .map(|(_, p)| p)
            .ok_or_else(|| ComputeError::Dispatch("no pipeline for this queue".to_string()))?;
        let device = &queue.device;

        let gpu_buffers: Vec<wgpu::Buffer> = binds
            .iter()
            .enumerate()
            .map(|(i, view)| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Binding {i}")),
                    contents: if view.data.is_empty() { &[0u8; 16] } else { &view.data },
                    usage: match view.kind {
                        BindingKind::Uniform => {
                            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST
                        }
                        BindingKind::StorageRead | BindingKind::StorageReadWrite => {
                            wgpu::BufferUsages::STORAGE
                                | wgpu::BufferUsages::COPY_DST
                                | wgpu::BufferUsages::COPY_SRC
                        }
                    },
                })
            })
            .collect();

        let entries: Vec<wgpu::BindGroupEntry> = gpu_buffers
            .iter()
            .enumerate()
            .map(|(i, buffer)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tpm bind group"),
            layout: &pipeline.get_bind_group_layout(0),
            entries: &entries,
        });

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("tpm pass"),
                timestamp_writes: None,
            });
            cpass.set_pipeline(pipeline);
            cpass.set_bind_group(0, &bind_group, &[]);
            cpass.dispatch_workgroups(workgroups[0], workgroups[1], workgroups[2]);
        }

        let mut staging = Vec::new();
        for (view, buffer) in binds.iter().zip(&gpu_buffers) {
            if view.kind.is_writable() {
                let size = view.data.len() as u64;
                let staging_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Staging Buffer"),
                    size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                encoder.copy_buffer_to_buffer(buffer, 0, &staging_buffer, 0, size);
                staging.push(staging_buffer);
            }
        }

        queue.queue.submit(Some(encoder.finish()));

        let mut results = Vec::with_capacity(staging.len());
        for buffer in &staging {
            let slice = buffer.slice(..);
            let (tx, rx) = std::sync::mpsc::channel();
            slice.map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
            device.poll(wgpu::Maintain::Wait);
            rx.recv()
                .map_err(|e| ComputeError::Dispatch(e.to_string()))?
                .map_err(|e| ComputeError::Dispatch(e.to_string()))?;
            results.push(slice.get_mapped_range().to_vec());
            buffer.unmap();
        }
        Ok(results)
    }
}
