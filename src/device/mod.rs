//! Compute device selection (accelerator vs. general-purpose compute).
//!
//! - [`probe`] reports the accelerator the process can see.
//! - [`policy`] decides which compute-capability tiers are usable.
//! - [`DeviceSelector`] combines both and never fails: any probe error
//!   degrades to [`DeviceChoice::GeneralPurpose`].

pub mod error;
pub mod policy;
pub mod probe;
mod selector;
mod types;


pub use error::ProbeError;
pub use policy::CompatibilityPolicy;
pub use probe::{HardwareProbe, StaticProbe, SystemProbe, parse_nvidia_smi_row};
pub use selector::{DeviceSelector, select_device};
pub use types::{
    AcceleratorBackend, ComputeTier, DeviceChoice, DevicePreference, HardwareDescriptor,
};
