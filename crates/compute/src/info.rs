//! Platform and device descriptions reported during discovery.

use std::fmt;
use uuid::Uuid;

const BYTE_SUFFIX: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    #[default]
    Default,
    Cpu,
    Gpu,
    Accelerator,
    Custom,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Default => "DEFAULT",
            DeviceType::Cpu => "CPU",
            DeviceType::Gpu => "GPU",
            DeviceType::Accelerator => "ACCELERATOR",
            DeviceType::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

/// Capability fields a runtime reports for one device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceCapabilities {
    pub device_type: DeviceType,
    pub name: String,
    pub vendor: String,
    pub profile: String,
    pub version: String,
    pub max_compute_units: u32,
    /// Maximum clock frequency in MHz.
    pub max_clock_frequency: u32,
    /// Global memory in bytes.
    pub max_memory: u64,
    /// Intermediate representations the device accepts, e.g. `SPIR-V_1.2`.
    pub il_versions: Vec<String>,
    pub available: bool,
    pub compiler_available: bool,
}

impl DeviceCapabilities {
    /// Devices that are unavailable or lack a compiler never leave the `Discovered` state.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.available && self.compiler_available
    }

    #[must_use]
    pub fn spirv_support(&self) -> bool {
        self.il_versions.iter().any(|il| il.starts_with("SPIR-V"))
    }

    /// One line summary: `8@3.2GHz 15.5GB [SPIR-V]`.
    #[must_use]
    pub fn summary(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let ghz = self.max_clock_frequency as f32 / 1000.0;
        let memory = format_bytes(self.max_memory);
        let mut line = format!("{}@{ghz}GHz {memory}", self.max_compute_units);
        if self.spirv_support() {
            line.push_str(" [SPIR-V]");
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub uuid: Uuid,
    pub platform: Uuid,
    pub capabilities: DeviceCapabilities,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlatformProfile {
    pub name: String,
    pub vendor: String,
    pub profile: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformInfo {
    pub uuid: Uuid,
    pub profile: PlatformProfile,
    pub devices: Vec<DeviceInfo>,
}

impl PlatformInfo {
    pub fn usable_devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter().filter(|d| d.capabilities.is_usable())
    }
}

impl fmt::Display for PlatformInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({}) {{vendor={}, profile={}, version={}}}",
            self.profile.name,
            self.uuid,
            self.profile.vendor,
            self.profile.profile,
            self.profile.version
        )?;
        for device in &self.devices {
            let caps = &device.capabilities;
            writeln!(
                f,
                "  [{}] {} ({}) {} available={} compiler={}",
                caps.device_type,
                caps.name,
                device.uuid,
                caps.summary(),
                caps.available,
                caps.compiler_available
            )?;
        }
        Ok(())
    }
}

/// Everything one host discovered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostInfo {
    pub platforms: Vec<PlatformInfo>,
}

/// Formats a byte count with a binary suffix, e.g. `1536` → `1.5KB`.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0.0B".to_string();
    }
    #[allow(clippy::cast_precision_loss)]
    let value = bytes as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let place = ((value.ln() / 1024f64.ln()).floor() as usize).min(BYTE_SUFFIX.len() - 1);
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let scaled = value / 1024f64.powi(place as i32);
    format!("{scaled:.1}{}", BYTE_SUFFIX[place])
}
