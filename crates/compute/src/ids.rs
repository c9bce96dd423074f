//! Identifier generation for platforms, devices and the resources built on them.
//!
//! Every record the orchestrator keeps is keyed by a UUID instead of a native
//! handle. The generator is an explicit value threaded through the discovery
//! and setup calls, so a fixed seed gives reproducible identifiers in tests.

use uuid::{Builder, Uuid};

#[derive(Debug, Clone)]
pub struct IdGenerator {
    rng: fastrand::Rng,
    namespace: Uuid,
}

impl IdGenerator {
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        let rng = fastrand::Rng::with_seed(seed);
        let namespace = Builder::from_random_bytes(rng.u128(..).to_le_bytes()).into_uuid();
        Self { rng, namespace }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self::with_seed(fastrand::u64(..))
    }

    /// A fresh random (version 4) identifier.
    pub fn random(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.u128(..).to_le_bytes()).into_uuid()
    }

    /// A name based (version 5) identifier, stable for the lifetime of this generator.
    #[must_use]
    pub fn named(&self, name: &str) -> Uuid {
        Uuid::new_v5(&self.namespace, name.as_bytes())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
