//! Hardware probes.
//!
//! A probe only reports what it sees. Whether the reported accelerator is used
//! is decided by [`select_device`](super::select_device).

#[cfg(any(feature = "metal", feature = "cuda"))]
use candle_core::Device;
#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::debug;

use super::error::ProbeError;
use super::types::{AcceleratorBackend, ComputeTier, HardwareDescriptor};

const MIB: u64 = 1024 * 1024;

/// Source of [`HardwareDescriptor`]s.
pub trait HardwareProbe: Send + Sync {
    /// Returns the accelerator to consider, or `None` if there is none.
    fn probe(&self) -> Result<Option<HardwareDescriptor>, ProbeError>;
}

/// Probe that reports a fixed descriptor.
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    descriptor: Option<HardwareDescriptor>,
}

impl StaticProbe {
    pub fn new(descriptor: Option<HardwareDescriptor>) -> Self {
        Self { descriptor }
    }

    pub fn accelerator(descriptor: HardwareDescriptor) -> Self {
        Self::new(Some(descriptor))
    }

    pub fn none() -> Self {
        Self::new(None)
    }
}

impl HardwareProbe for StaticProbe {
    fn probe(&self) -> Result<Option<HardwareDescriptor>, ProbeError> {
        Ok(self.descriptor.clone())
    }
}

/// Probes the accelerators compiled into this build (CUDA, then Metal).
///
/// Without the `cuda` or `metal` feature it always reports no accelerator.
#[derive(Debug, Clone, Default)]
pub struct SystemProbe {
    ordinal: usize,
}

impl SystemProbe {
    pub fn new(ordinal: usize) -> Self {
        Self { ordinal }
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl HardwareProbe for SystemProbe {
    fn probe(&self) -> Result<Option<HardwareDescriptor>, ProbeError> {
        #[cfg(any(feature = "metal", feature = "cuda"))]
        let mut last_failure: Option<ProbeError> = None;

        #[cfg(feature = "cuda")]
        {
            match probe_cuda(self.ordinal) {
                Ok(descriptor) => return Ok(Some(descriptor)),
                Err(e) => {
                    debug!(error = %e, "CUDA probe failed");
                    last_failure = Some(e);
                }
            }
        }

        #[cfg(feature = "metal")]
        {
            match Device::new_metal(self.ordinal) {
                Ok(_) => {
                    let descriptor =
                        HardwareDescriptor::metal("Apple Metal GPU").with_ordinal(self.ordinal);
                    return Ok(Some(descriptor));
                }
                Err(e) => {
                    debug!(error = %e, "Metal probe failed");
                    last_failure = Some(e.into());
                }
            }
        }

        #[cfg(any(feature = "metal", feature = "cuda"))]
        {
            if let Some(failure) = last_failure {
                return Err(failure);
            }
        }

        Ok(None)
    }
}

#[cfg(feature = "cuda")]
fn probe_cuda(ordinal: usize) -> Result<HardwareDescriptor, ProbeError> {
    match query_nvidia_smi(ordinal) {
        Ok(descriptor) => Ok(descriptor),
        Err(smi_error) => {
            debug!(error = %smi_error, "nvidia-smi unavailable, opening CUDA device directly");
            Device::new_cuda(ordinal)?;
            Ok(HardwareDescriptor {
                name: format!("CUDA device {ordinal}"),
                backend: AcceleratorBackend::Cuda,
                ordinal,
                capability: ComputeTier::UNVERSIONED,
                total_memory_bytes: 0,
            })
        }
    }
}

#[cfg(feature = "cuda")]
fn query_nvidia_smi(ordinal: usize) -> Result<HardwareDescriptor, ProbeError> {
    const COMMAND: &str = "nvidia-smi";

    let output = std::process::Command::new(COMMAND)
        .arg("--query-gpu=name,compute_cap,memory.total")
        .arg("--format=csv,noheader,nounits")
        .arg(format!("--id={ordinal}"))
        .output()
        .map_err(|e| ProbeError::CommandFailed {
            command: COMMAND.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ProbeError::CommandFailed {
            command: COMMAND.to_string(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| ProbeError::Unparseable {
            line: String::new(),
            reason: "no GPU rows reported".to_string(),
        })?;

    parse_nvidia_smi_row(line, ordinal)
}

/// Parses one `name, compute_cap, memory.total` row (memory in MiB) as printed
/// by `nvidia-smi --format=csv,noheader,nounits`.
pub fn parse_nvidia_smi_row(line: &str, ordinal: usize) -> Result<HardwareDescriptor, ProbeError> {
    let unparseable = |reason: &str| ProbeError::Unparseable {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let mut fields = line.rsplitn(3, ',');
    let memory = fields.next().ok_or_else(|| unparseable("missing memory.total"))?;
    let capability = fields.next().ok_or_else(|| unparseable("missing compute_cap"))?;
    let name = fields.next().ok_or_else(|| unparseable("missing name"))?.trim();

    if name.is_empty() {
        return Err(unparseable("empty device name"));
    }

    let capability: ComputeTier = capability.parse()?;
    let memory_mib: u64 = memory
        .trim()
        .parse()
        .map_err(|_| unparseable("memory.total is not an integer"))?;

    Ok(HardwareDescriptor {
        name: name.to_string(),
        backend: AcceleratorBackend::Cuda,
        ordinal,
        capability,
        total_memory_bytes: memory_mib * MIB,
    })
}
