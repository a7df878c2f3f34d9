//! Plan assembly and the processes it depends on.
//!
//! This module provides the [`Bundler`] orchestrator, the staged
//! [`CommandPlan`] every platform builds, and the extra-file signer that
//! probes the signing host before emitting its commands.
//!
//! # Module Organization
//!
//! - [`checksum`] - SHA-1 digests for settings snapshots
//! - `orchestrator` - [`Bundler`], planning and publishing
//! - `plan` - [`CommandPlan`] and its [`Stage`]s
//! - `runner` - [`CommandRunner`] seam for subprocesses with timeouts
//! - `signing` - [`ExtraFilesSigner`]
//! - [`tool_detection`] - external tool lookup

pub mod checksum;
mod orchestrator;
mod plan;
mod runner;
mod signing;
pub mod tool_detection;

pub use orchestrator::Bundler;
pub use plan::{CommandPlan, PlanStage, Stage};
pub use runner::{CommandRunner, ShellRunner, capture_with_retries};
pub use signing::{ExtraFilesSigner, SSH_KEY_ENV, SSH_PORT_ENV, SshOptions};
