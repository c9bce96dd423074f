use crate::info::{DeviceCapabilities, PlatformProfile};
use crate::{BufferView, ComputeError};

/// One platform as enumerated by a native runtime, before identifiers are assigned.
pub struct Enumerated<P, D> {
    pub profile: PlatformProfile,
    pub platform: P,
    pub devices: Vec<(DeviceCapabilities, D)>,
}

/// A failed kernel build with the diagnostic log of every device involved.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFailure {
    pub reason: String,
    /// `(device name, build log)` pairs.
    pub device_logs: Vec<(String, String)>,
}

impl BuildFailure {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into(), device_logs: Vec::new() }
    }

    #[must_use]
    pub fn with_log(mut self, device: impl Into<String>, log: impl Into<String>) -> Self {
        self.device_logs.push((device.into(), log.into()));
        self
    }
}

/// Thin seam over a native compute runtime.
///
/// Implementations only wrap the runtime calls. Bookkeeping (identifiers,
/// grouping devices by platform, partial failure handling, logging) lives in
/// [`crate::ApiHost`] so every runtime gets the same orchestration semantics.
pub trait ComputeApi: Send + Sync + 'static {
    type Platform: Send + Sync;
    type Device: Send + Sync;
    type Context: Send + Sync;
    type Queue: Send + Sync;
    type Kernel: Send + Sync;

    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Lists every platform and its devices, including unavailable ones.
    fn enumerate(&mut self) -> Result<Vec<Enumerated<Self::Platform, Self::Device>>, ComputeError>;

    /// Creates an execution context spanning `devices`, all from `platform`.
    fn create_context(
        &mut self,
        platform: &Self::Platform,
        devices: &[&Self::Device],
    ) -> Result<Self::Context, ComputeError>;

    /// Creates the command queue for one `(context, device)` pair.
    fn create_queue(
        &mut self,
        context: &Self::Context,
        device: &Self::Device,
    ) -> Result<Self::Queue, ComputeError>;

    /// Builds `source` against every device of `context`.
    fn build(
        &mut self,
        context: &Self::Context,
        devices: &[&Self::Device],
        source: &str,
    ) -> Result<Self::Kernel, BuildFailure>;

    /// Whether [`ComputeApi::dispatch`] actually runs kernels.
    fn executes_kernels(&self) -> bool {
        false
    }

    /// Runs `kernel` on `queue` and blocks until the writable bindings are read back.
    ///
    /// Returns the bytes of every [`crate::BindingKind::StorageReadWrite`]
    /// binding, in binding order.
    fn dispatch(
        &self,
        kernel: &Self::Kernel,
        queue: &Self::Queue,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError>;
}
