//! Native runtimes reachable through [`crate::ComputeApi`].

#[cfg(feature = "cpu")]
pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
