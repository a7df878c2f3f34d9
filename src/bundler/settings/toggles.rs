//! Environment-sourced switches that steer the packaging plan.

/// Enables code signing, signature verification and notarization stages.
pub const FORCE_SIGNING_ENV: &str = "KODEGEN_FORCE_SIGNING";

/// Skips notarization even when signing is forced.
pub const NO_NOTARIZE_ENV: &str = "KODEGEN_NO_NOTARIZE";

/// Global build toggles.
///
/// Read once before planning; planning never consults the environment itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildToggles {
    /// Attempt every signing stage and treat an unreachable signing host as fatal.
    pub force_signing: bool,

    /// Leave out notarization.
    pub skip_notarization: bool,
}

impl BuildToggles {
    /// Reads the toggles from the process environment.
    ///
    /// Any non-empty value switches a toggle on.
    pub fn from_env() -> Self {
        Self {
            force_signing: env_flag(FORCE_SIGNING_ENV),
            skip_notarization: env_flag(NO_NOTARIZE_ENV),
        }
    }

    /// Whether the notarization stage belongs in the plan.
    pub fn notarize(&self) -> bool {
        self.force_signing && !self.skip_notarization
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|value| !value.is_empty())
}
