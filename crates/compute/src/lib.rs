#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM Compute
//!
//! Discovery and orchestration of the compute platforms the renderer can
//! dispatch work to.
//!
//! A *platform* is a vendor runtime grouping one or more devices. The
//! [`Orchestrator`] asks every registered [`Host`] for its platforms, builds
//! one context per platform, one command queue per device and compiles the
//! shared kernel source against every platform independently. Failures are
//! recorded per platform and never stop the remaining platforms from making
//! progress.
//!
//! Native runtimes are reached through the [`ComputeApi`] seam:
//!
//! -   [`CpuApi`] (feature `cpu`, default) exposes the host processor and
//!     validates kernels with `naga`.
//! -   [`MockApi`] (feature `mock`) is a scripted runtime used by tests.
//! -   [`WgpuApi`] (feature `gpu`) drives real adapters through `wgpu`.

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub mod api;
pub mod backend;
pub mod host;
pub mod ids;
pub mod info;
pub mod kernel;
pub mod orchestrator;

pub use api::{BuildFailure, ComputeApi, Enumerated};
pub use host::{any_succeeded, ApiHost, Host, Outcome};
pub use ids::IdGenerator;
pub use info::{
    format_bytes, DeviceCapabilities, DeviceInfo, DeviceType, HostInfo, PlatformInfo,
    PlatformProfile,
};
pub use orchestrator::{Dispatcher, Orchestrator, PlatformEntry, PlatformState};

#[cfg(feature = "cpu")]
pub use backend::cpu::CpuApi;
#[cfg(any(test, feature = "mock"))]
pub use backend::mock::{MockApi, MockDevice, MockEvent, MockLog, MockPlatform};
#[cfg(feature = "gpu")]
pub use backend::gpu::WgpuApi;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputeError {
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("backend not available")]
    BackendUnavailable,
    #[error("unknown platform {0}")]
    UnknownPlatform(Uuid),
    #[error("unknown device {0}")]
    UnknownDevice(Uuid),
    #[error("platform {0} has no execution context")]
    NotInitialized(Uuid),
    #[error("platform {0} has no compiled kernel")]
    NotCompiled(Uuid),
    #[error("failed to create context: {0}")]
    ContextCreation(String),
    #[error("failed to create command queue: {0}")]
    QueueCreation(String),
    #[error("kernel build failed: {0}")]
    Build(String),
    #[error("the {0} host does not execute kernels")]
    DispatchUnsupported(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// How a kernel binding is exposed to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    Uniform,
    StorageRead,
    StorageReadWrite,
}

impl BindingKind {
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, BindingKind::StorageReadWrite)
    }
}

#[derive(Clone, Debug)]
pub struct BufferView {
    pub data: Arc<[u8]>,
    pub shape: Vec<usize>, // Number of elements per dimension
    pub element_size_in_bytes: usize,
    pub kind: BindingKind,
}

impl BufferView {
    #[must_use]
    pub fn new(
        data: Arc<[u8]>,
        shape: Vec<usize>,
        element_size_in_bytes: usize,
        kind: BindingKind,
    ) -> Self {
        Self { data, shape, element_size_in_bytes, kind }
    }

    /// Wraps a slice of `Pod` values as a one dimensional binding.
    #[must_use]
    pub fn from_slice<T: bytemuck::Pod>(values: &[T], kind: BindingKind) -> Self {
        let data: Arc<[u8]> = bytemuck::cast_slice(values).to_vec().into();
        Self::new(data, vec![values.len()], std::mem::size_of::<T>(), kind)
    }

    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Checks that the byte length matches the product of the shape and the element size.
    pub fn validate(&self) -> Result<(), ComputeError> {
        let expected_elements = self.shape.iter().product::<usize>();
        let expected_bytes = expected_elements * self.element_size_in_bytes;
        if self.data.len() == expected_bytes {
            Ok(())
        } else {
            Err(ComputeError::ShapeMismatch(
                "Buffer data length does not match product of shape dimensions and element size",
            ))
        }
    }
}

/// Returns the hosts available in this build, in registration order.
///
/// With the `gpu` feature a `wgpu` host is registered first so real adapters
/// are preferred at dispatch time; the CPU host is always present when the
/// `cpu` feature is enabled.
#[must_use]
pub fn default_hosts() -> Vec<Box<dyn Host>> {
    let mut hosts: Vec<Box<dyn Host>> = Vec::new();

    #[cfg(feature = "gpu")]
    {
        tracing::info!(target: "tpm::host", "Registering wgpu host.");
        hosts.push(Box::new(ApiHost::new(WgpuApi::new())));
    }

    #[cfg(feature = "cpu")]
    {
        tracing::info!(target: "tpm::host", "Registering native CPU host.");
        hosts.push(Box::new(ApiHost::new(CpuApi::new())));
    }

    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_shape_fails() {
        let bad = BufferView::new(vec![0u8; 12].into(), vec![4], 4, BindingKind::StorageRead);
        assert!(
            matches!(bad.validate(), Err(ComputeError::ShapeMismatch(_))),
            "Expected ShapeMismatch for 3x f32s with shape [4]"
        );
    }

    #[test]
    fn correct_shape_succeeds() {
        let good = BufferView::new(vec![0u8; 16].into(), vec![4], 4, BindingKind::StorageRead);
        assert!(good.validate().is_ok());
    }

    #[test]
    fn shape_product_is_zero() {
        let empty = BufferView::new(vec![0u8; 0].into(), vec![0, 4], 1, BindingKind::Uniform);
        assert!(empty.validate().is_ok());

        let stray = BufferView::new(vec![0u8; 1].into(), vec![0, 4], 1, BindingKind::Uniform);
        assert!(matches!(stray.validate(), Err(ComputeError::ShapeMismatch(_))));
    }

    #[test]
    fn from_slice_records_element_size() {
        let view = BufferView::from_slice(&[1.0f32, 2.0, 3.0], BindingKind::StorageReadWrite);
        assert_eq!(view.shape, vec![3]);
        assert_eq!(view.element_size_in_bytes, 4);
        assert_eq!(view.len_bytes(), 12);
        assert!(view.kind.is_writable());
    }
}
