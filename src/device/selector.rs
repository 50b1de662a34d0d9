use tracing::{debug, info, warn};

use super::policy::CompatibilityPolicy;
use super::probe::{HardwareProbe, SystemProbe};
use super::types::{DeviceChoice, DevicePreference, HardwareDescriptor};

/// Decides where inference runs for a given (optional) accelerator.
///
/// No accelerator means general-purpose compute. A present accelerator is used
/// whenever `policy` supports its tier, which the permissive policy does for
/// every tier.
pub fn select_device(
    descriptor: Option<&HardwareDescriptor>,
    policy: &CompatibilityPolicy,
) -> DeviceChoice {
    let Some(descriptor) = descriptor else {
        info!(device = "cpu", reason = "no accelerator detected", "Selected compute device");
        return DeviceChoice::GeneralPurpose;
    };

    if !policy.supported(descriptor.capability) {
        warn!(
            device = "cpu",
            accelerator = %descriptor.name,
            capability = %descriptor.capability,
            reason = "tier recorded as incompatible",
            "Selected compute device"
        );
        return DeviceChoice::GeneralPurpose;
    }

    let choice = DeviceChoice::Accelerator {
        backend: descriptor.backend,
        ordinal: descriptor.ordinal,
    };

    info!(
        device = %choice,
        accelerator = %descriptor.name,
        capability = %descriptor.capability,
        total_memory_bytes = descriptor.total_memory_bytes,
        reason = "accelerator detected",
        "Selected compute device"
    );

    choice
}

/// Probe + policy + operator preference.
pub struct DeviceSelector {
    probe: Box<dyn HardwareProbe>,
    policy: CompatibilityPolicy,
    preference: DevicePreference,
}

impl std::fmt::Debug for DeviceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSelector")
            .field("policy", &self.policy)
            .field("preference", &self.preference)
            .finish()
    }
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::system()
    }
}

impl DeviceSelector {
    pub fn new<P: HardwareProbe + 'static>(probe: P) -> Self {
        Self {
            probe: Box::new(probe),
            policy: CompatibilityPolicy::permissive(),
            preference: DevicePreference::Auto,
        }
    }

    /// Selector backed by [`SystemProbe`] on device ordinal 0.
    pub fn system() -> Self {
        Self::new(SystemProbe::default())
    }

    pub fn with_policy(mut self, policy: CompatibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_preference(mut self, preference: DevicePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn policy(&self) -> &CompatibilityPolicy {
        &self.policy
    }

    pub fn preference(&self) -> DevicePreference {
        self.preference
    }

    /// Probes hardware and returns the device choice. Never fails.
    pub fn select(&self) -> DeviceChoice {
        if self.preference == DevicePreference::Cpu {
            info!(device = "cpu", reason = "cpu preference configured", "Selected compute device");
            return DeviceChoice::GeneralPurpose;
        }

        let descriptor = match self.probe.probe() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(error = %e, "Hardware probe failed, treating as no accelerator");
                None
            }
        };

        debug!(?descriptor, "Hardware probe complete");
        select_device(descriptor.as_ref(), &self.policy)
    }
}
