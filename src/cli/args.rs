//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap, with validation of
//! the target platform before any description is loaded.

use crate::bundler::{platform::PlatformDescriptor, project::dsl::ComponentFilter};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plans platform package builds from project descriptions
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_pipeline",
    version,
    about = "Plans platform package builds from project descriptions",
    long_about = "Loads a project description for one target platform and prints the ordered
shell commands that package, sign and notarize it.

The config directory holds projects/<name>.toml, components/<name>.toml and
platforms/<name>.toml. Platform names follow <os>-<version>-<arch>.

Usage:
  kodegen_bundler_pipeline plan --project agent --platform osx-15-arm64
  kodegen_bundler_pipeline resolve --project agent --platform el-9-x86_64 --component ruby
  kodegen_bundler_pipeline publish --project agent --platform debian-13-amd64 --output output

Set KODEGEN_FORCE_SIGNING to plan every signing stage, KODEGEN_NO_NOTARIZE to skip
notarization."
)]
pub struct Args {
    /// Directory holding projects/, components/ and platforms/
    #[arg(
        short = 'c',
        long,
        env = "KODEGEN_CONFIGDIR",
        default_value = "configs",
        global = true
    )]
    pub configdir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the packaging command plan
    Plan {
        #[command(flatten)]
        target: Target,

        /// Plan every signing stage and fail if the signing host is unreachable
        #[arg(long)]
        force_signing: bool,

        /// Leave notarization out of the plan
        #[arg(long)]
        no_notarize: bool,

        /// Print the plan as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Print the components to build, in build order
    Resolve {
        #[command(flatten)]
        target: Target,

        /// Resolve only this component and its requirements
        #[arg(long, value_name = "NAME")]
        component: Option<String>,

        /// Print the command installing host build requirements instead
        #[arg(long)]
        build_dependencies: bool,
    },

    /// Write build metadata and the settings snapshot
    Publish {
        #[command(flatten)]
        target: Target,

        /// Directory receiving the published files
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,
    },
}

impl Command {
    pub fn target(&self) -> &Target {
        match self {
            Self::Plan { target, .. } | Self::Resolve { target, .. } | Self::Publish { target, .. } => target,
        }
    }
}

/// Project and platform selection shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct Target {
    /// Project to load from projects/<name>.toml
    #[arg(short, long, value_name = "NAME")]
    pub project: String,

    /// Target platform, e.g. el-9-x86_64
    #[arg(short = 'P', long, env = "KODEGEN_PLATFORM", value_name = "PLATFORM")]
    pub platform: String,

    /// Load only these components (comma separated)
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub components: Option<Vec<String>>,
}

impl Target {
    pub fn component_filter(&self) -> ComponentFilter {
        match &self.components {
            Some(names) => ComponentFilter::Only(names.clone()),
            None => ComponentFilter::All,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        let target = self.command.target();
        if target.project.trim().is_empty() {
            return Err("Project cannot be empty".to_string());
        }
        PlatformDescriptor::parse(&target.platform).map_err(|e| e.to_string())?;
        Ok(())
    }
}
