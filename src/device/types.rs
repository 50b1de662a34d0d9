use std::fmt;
use std::str::FromStr;

use candle_core::Device;
use tracing::{info, warn};

use super::error::ProbeError;

/// Accelerator family reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceleratorBackend {
    Cuda,
    Metal,
}

impl fmt::Display for AcceleratorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceleratorBackend::Cuda => write!(f, "cuda"),
            AcceleratorBackend::Metal => write!(f, "metal"),
        }
    }
}

/// Compute-capability tier, ordered by major then minor version.
///
/// `0.0` is used for accelerators that do not expose a versioned capability
/// (Metal, or CUDA devices opened without `nvidia-smi`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComputeTier {
    pub major: u32,
    pub minor: u32,
}

impl ComputeTier {
    pub const UNVERSIONED: ComputeTier = ComputeTier { major: 0, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ComputeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ComputeTier {
    type Err = ProbeError;

    /// Parses `"8.6"`, `"12.0"` or a bare major version such as `"9"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unparseable = |reason: &str| ProbeError::Unparseable {
            line: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };

        let major = major
            .parse::<u32>()
            .map_err(|_| unparseable("invalid major compute capability"))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|_| unparseable("invalid minor compute capability"))?;

        Ok(Self { major, minor })
    }
}

/// Immutable snapshot of one accelerator, as reported by a
/// [`HardwareProbe`](super::HardwareProbe).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareDescriptor {
    pub name: String,
    pub backend: AcceleratorBackend,
    pub ordinal: usize,
    pub capability: ComputeTier,
    pub total_memory_bytes: u64,
}

impl HardwareDescriptor {
    pub fn cuda(name: impl Into<String>, capability: ComputeTier, total_memory_bytes: u64) -> Self {
        Self {
            name: name.into(),
            backend: AcceleratorBackend::Cuda,
            ordinal: 0,
            capability,
            total_memory_bytes,
        }
    }

    pub fn metal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend: AcceleratorBackend::Metal,
            ordinal: 0,
            capability: ComputeTier::UNVERSIONED,
            total_memory_bytes: 0,
        }
    }

    pub fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = ordinal;
        self
    }
}

/// Where inference runs. Decided once per scorer and cached for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChoice {
    Accelerator {
        backend: AcceleratorBackend,
        ordinal: usize,
    },
    GeneralPurpose,
}

impl DeviceChoice {
    pub fn is_accelerator(&self) -> bool {
        matches!(self, DeviceChoice::Accelerator { .. })
    }

    /// Opens the candle device for this choice.
    ///
    /// If the runtime refuses the accelerator, the CPU device is returned
    /// together with [`DeviceChoice::GeneralPurpose`] so the caller can record
    /// the effective choice.
    pub fn open(self) -> (DeviceChoice, Device) {
        let DeviceChoice::Accelerator { backend, ordinal } = self else {
            return (DeviceChoice::GeneralPurpose, Device::Cpu);
        };

        let opened = match backend {
            AcceleratorBackend::Cuda => Device::new_cuda(ordinal),
            AcceleratorBackend::Metal => Device::new_metal(ordinal),
        };

        match opened {
            Ok(device) => {
                info!(%backend, ordinal, "Opened accelerator device");
                (self, device)
            }
            Err(e) => {
                warn!(
                    %backend,
                    ordinal,
                    error = %e,
                    "Runtime rejected accelerator, falling back to CPU device"
                );
                (DeviceChoice::GeneralPurpose, Device::Cpu)
            }
        }
    }
}

impl fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceChoice::Accelerator { backend, ordinal } => write!(f, "{backend}:{ordinal}"),
            DeviceChoice::GeneralPurpose => write!(f, "cpu"),
        }
    }
}

/// Operator override for device selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Probe hardware and use an accelerator when one is present.
    #[default]
    Auto,
    /// Skip probing and always use general-purpose compute.
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(DevicePreference::Auto),
            "cpu" => Ok(DevicePreference::Cpu),
            other => Err(format!("expected 'auto' or 'cpu', got '{other}'")),
        }
    }
}
