//! Package-build orchestrator.
//!
//! Given a project description (components, their build requirements and a
//! target platform), this library resolves what must be built, merges settings
//! inherited from upstream projects, and emits the ordered shell commands that
//! turn a built source tree into a signed, distributable package:
//! - macOS disk images (pkgbuild/productbuild, optional signing and notarization)
//! - Debian packages (debuild)
//! - RPM packages (rpmbuild)
//! - Windows installers (WiX)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
