//! Multi-host, multi-platform setup with per-platform failure isolation.
//!
//! Every platform moves through `Discovered → Initialized → Compiled` on its
//! own. A failed step leaves the platform in its previous state and records
//! the error; it never prevents the other platforms from advancing.

use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::host::{any_succeeded, Host, Outcome};
use crate::ids::IdGenerator;
use crate::info::PlatformInfo;
use crate::{BufferView, ComputeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlatformState {
    Discovered,
    Initialized,
    Compiled,
}

impl fmt::Display for PlatformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlatformState::Discovered => "discovered",
            PlatformState::Initialized => "initialized",
            PlatformState::Compiled => "compiled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PlatformEntry {
    pub info: PlatformInfo,
    host: usize,
    pub state: PlatformState,
    /// Error from the most recent failed step, cleared on success.
    pub last_error: Option<ComputeError>,
}

impl PlatformEntry {
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.info.uuid
    }
}

pub struct Orchestrator {
    hosts: Vec<Box<dyn Host>>,
    platforms: Vec<PlatformEntry>,
    ids: IdGenerator,
}

impl Orchestrator {
    #[must_use]
    pub fn new(ids: IdGenerator) -> Self {
        Self { hosts: Vec::new(), platforms: Vec::new(), ids }
    }

    /// An orchestrator over [`crate::default_hosts`].
    #[must_use]
    pub fn with_default_hosts(ids: IdGenerator) -> Self {
        let mut orchestrator = Self::new(ids);
        orchestrator.hosts.extend(crate::default_hosts());
        orchestrator
    }

    pub fn push_host(&mut self, host: Box<dyn Host>) {
        self.hosts.push(host);
    }

    #[must_use]
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Enumerates the platforms of every host, replacing any previous discovery.
    ///
    /// Never fails: hosts without platforms are logged and skipped.
    pub fn discover(&mut self) -> &[PlatformEntry] {
        self.platforms.clear();
        for (index, host) in self.hosts.iter_mut().enumerate() {
            let info = host.info(&mut self.ids);
            if info.platforms.is_empty() {
                warn!(target: "tpm::orchestrator", "{}: no platforms discovered", host.name());
            }
            for platform in info.platforms {
                info!(
                    target: "tpm::orchestrator",
                    "Platform {} ({})",
                    platform.profile.name,
                    platform.uuid
                );
                for device in &platform.devices {
                    let caps = &device.capabilities;
                    if caps.is_usable() {
                        debug!(
                            target: "tpm::orchestrator",
                            "  Device {} ({}) {}",
                            caps.name,
                            device.uuid,
                            caps.summary()
                        );
                    } else {
                        debug!(
                            target: "tpm::orchestrator",
                            "  Excluding device {} ({}): available={} compiler_available={}",
                            caps.name, device.uuid, caps.available, caps.compiler_available
                        );
                    }
                }
                self.platforms.push(PlatformEntry {
                    info: platform,
                    host: index,
                    state: PlatformState::Discovered,
                    last_error: None,
                });
            }
        }
        &self.platforms
    }

    /// Initializes every usable device of every discovered platform.
    pub fn initialize(&mut self) -> bool {
        let devices: Vec<Uuid> = self
            .platforms
            .iter()
            .flat_map(|p| p.info.usable_devices().map(|d| d.uuid))
            .collect();
        self.initialize_devices(&devices)
    }

    /// Groups `devices` by platform and creates a context and queues for each
    /// group. Returns `true` if at least one platform initialized.
    pub fn initialize_devices(&mut self, devices: &[Uuid]) -> bool {
        let mut outcomes = Vec::new();
        for (index, host) in self.hosts.iter_mut().enumerate() {
            let owned: Vec<Uuid> = devices
                .iter()
                .copied()
                .filter(|d| {
                    self.platforms
                        .iter()
                        .any(|p| p.host == index && p.info.devices.iter().any(|dev| dev.uuid == *d))
                })
                .collect();
            if owned.is_empty() {
                continue;
            }
            outcomes.extend(host.initialize(&owned, &mut self.ids));
        }
        self.apply(&outcomes, PlatformState::Initialized);
        any_succeeded(&outcomes)
    }

    /// Compiles `source` on every initialized platform.
    pub fn compile(&mut self, source: &str) -> bool {
        let platforms: Vec<Uuid> = self
            .platforms
            .iter()
            .filter(|p| p.state >= PlatformState::Initialized)
            .map(PlatformEntry::uuid)
            .collect();
        self.compile_platforms(&platforms, source)
    }

    /// Compiles `source` on each listed platform. A platform whose build fails
    /// is skipped; the others are still attempted. Returns `true` if at least
    /// one platform compiled.
    pub fn compile_platforms(&mut self, platforms: &[Uuid], source: &str) -> bool {
        let mut outcomes = Vec::with_capacity(platforms.len());
        for &platform in platforms {
            let Some(entry) = self.platforms.iter().find(|p| p.uuid() == platform) else {
                warn!(target: "tpm::orchestrator", "Skipping unknown platform {platform}");
                outcomes.push(Outcome {
                    platform,
                    result: Err(ComputeError::UnknownPlatform(platform)),
                });
                continue;
            };
            let Some(host) = self.hosts.get_mut(entry.host) else { continue };
            outcomes.extend(host.compile(&[platform], source, &mut self.ids));
        }
        self.apply(&outcomes, PlatformState::Compiled);
        any_succeeded(&outcomes)
    }

    fn apply(&mut self, outcomes: &[Outcome], reached: PlatformState) {
        for outcome in outcomes {
            let Some(entry) = self
                .platforms
                .iter_mut()
                .find(|p| p.uuid() == outcome.platform)
            else {
                continue;
            };
            match &outcome.result {
                Ok(_) => {
                    entry.state = reached;
                    entry.last_error = None;
                }
                Err(e) => {
                    warn!(
                        target: "tpm::orchestrator",
                        "Platform {} skipped ({reached} step): {e}",
                        entry.info.profile.name
                    );
                    // A failed initialize tears the old context down with it.
                    if reached == PlatformState::Initialized {
                        entry.state = PlatformState::Discovered;
                    }
                    entry.last_error = Some(e.clone());
                }
            }
        }
    }

    #[must_use]
    pub fn state(&self, platform: Uuid) -> Option<PlatformState> {
        self.platforms.iter().find(|p| p.uuid() == platform).map(|p| p.state)
    }

    #[must_use]
    pub fn platforms(&self) -> &[PlatformEntry] {
        &self.platforms
    }

    #[must_use]
    pub fn compiled_platforms(&self) -> Vec<Uuid> {
        self.platforms
            .iter()
            .filter(|p| p.state == PlatformState::Compiled)
            .map(PlatformEntry::uuid)
            .collect()
    }

    /// Compiled platforms whose host actually runs kernels.
    #[must_use]
    pub fn dispatch_platforms(&self) -> Vec<Uuid> {
        self.platforms
            .iter()
            .filter(|p| p.state == PlatformState::Compiled)
            .filter(|p| self.hosts.get(p.host).is_some_and(|h| h.executes_kernels()))
            .map(PlatformEntry::uuid)
            .collect()
    }

    #[must_use]
    pub fn can_dispatch(&self) -> bool {
        !self.dispatch_platforms().is_empty()
    }

    pub fn dispatch(
        &self,
        platform: Uuid,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        self.dispatcher().dispatch(platform, binds, workgroups)
    }

    /// A shareable view for dispatching from several threads at once.
    ///
    /// The orchestrator itself is not `Sync` because it owns the identifier
    /// generator; the dispatcher only borrows the hosts and platform records.
    #[must_use]
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher { hosts: &self.hosts, platforms: &self.platforms }
    }
}

/// Read-only dispatch access to the compiled platforms of an [`Orchestrator`].
#[derive(Clone, Copy)]
pub struct Dispatcher<'a> {
    hosts: &'a [Box<dyn Host>],
    platforms: &'a [PlatformEntry],
}

impl Dispatcher<'_> {
    pub fn dispatch(
        &self,
        platform: Uuid,
        binds: &[BufferView],
        workgroups: [u32; 3],
    ) -> Result<Vec<Vec<u8>>, ComputeError> {
        let entry = self
            .platforms
            .iter()
            .find(|p| p.uuid() == platform)
            .ok_or(ComputeError::UnknownPlatform(platform))?;
        if entry.state != PlatformState::Compiled {
            return Err(ComputeError::NotCompiled(platform));
        }
        let host = self.hosts.get(entry.host).ok_or(ComputeError::UnknownPlatform(platform))?;
        host.dispatch(platform, binds, workgroups)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(IdGenerator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiHost, MockApi, MockDevice, MockPlatform};

    fn orchestrator(platforms: Vec<MockPlatform>) -> Orchestrator {
        let mut orchestrator = Orchestrator::new(IdGenerator::with_seed(42));
        orchestrator.push_host(Box::new(ApiHost::new(MockApi::new(platforms))));
        orchestrator
    }

    #[test]
    fn platforms_advance_through_states() {
        let mut o = orchestrator(vec![MockPlatform::new("a").with_device(MockDevice::new("a0"))]);
        o.discover();
        let id = o.platforms()[0].uuid();
        assert_eq!(o.state(id), Some(PlatformState::Discovered));
        assert!(o.initialize());
        assert_eq!(o.state(id), Some(PlatformState::Initialized));
        assert!(o.compile("kernel"));
        assert_eq!(o.state(id), Some(PlatformState::Compiled));
        assert_eq!(o.compiled_platforms(), vec![id]);
        assert!(o.can_dispatch());
    }

    #[test]
    fn nothing_discovered_means_nothing_succeeds() {
        let mut o = orchestrator(Vec::new());
        assert!(o.discover().is_empty());
        assert!(!o.initialize());
        assert!(!o.compile("kernel"));
        assert!(!o.can_dispatch());
    }

    #[test]
    fn dispatch_requires_compiled_platform() {
        let mut o = orchestrator(vec![MockPlatform::new("a").with_device(MockDevice::new("a0"))]);
        o.discover();
        let id = o.platforms()[0].uuid();
        o.initialize();
        assert!(matches!(o.dispatch(id, &[], [1, 1, 1]), Err(ComputeError::NotCompiled(_))));
        assert!(matches!(
            o.dispatch(Uuid::nil(), &[], [1, 1, 1]),
            Err(ComputeError::UnknownPlatform(_))
        ));
    }

    #[test]
    fn failed_build_keeps_initialized_state_and_error() {
        let mut o = orchestrator(vec![MockPlatform::new("a")
            .with_device(MockDevice::new("a0"))
            .failing_build("bad")]);
        o.discover();
        o.initialize();
        assert!(!o.compile("kernel"));
        let entry = &o.platforms()[0];
        assert_eq!(entry.state, PlatformState::Initialized);
        assert!(matches!(entry.last_error, Some(ComputeError::Build(_))));
    }
}
