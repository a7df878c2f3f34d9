//! Package-build orchestration core.
//!
//! Loading a project description produces a [`Project`](project::Project): its
//! settings (local and inherited), its component graph and its packaging
//! configuration for one target platform. The [`Bundler`] turns that project
//! into the ordered list of shell commands that produce a signed package.
//!
//! - [`project`] - the project aggregate, components and description directives
//! - [`settings`] - settings store, snapshots, signing configuration, toggles
//! - [`upstream`] - settings inheritance from upstream projects and snapshots
//! - [`platform`] - per-family packaging plans
//! - [`builder`] - plan types, the orchestrator and the extra-file signer

mod error;

pub mod builder;
pub mod platform;
pub mod project;
pub mod settings;
pub mod upstream;
pub mod utils;

pub use builder::Bundler;
pub use error::{Context, Error, ErrorCategory, ErrorExt, Result};
pub use project::{Project, load_project};
pub use upstream::UpstreamLoader;
