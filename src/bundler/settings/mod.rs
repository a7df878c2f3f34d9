//! Configuration state consulted while planning a build.
//!
//! This module provides the settings store that project descriptions write
//! into, the snapshot format used to publish and inherit it, and the signing
//! configuration and global toggles that steer the packaging plan.

mod arch;
mod signing;
pub mod snapshot;
mod store;
mod toggles;

// Re-export all public types
pub use arch::Arch;
pub use signing::{FILE_PLACEHOLDER, SigningSettings, file_basename};
pub use store::{SettingValue, SettingsStore};
pub use toggles::{BuildToggles, FORCE_SIGNING_ENV, NO_NOTARIZE_ENV};
