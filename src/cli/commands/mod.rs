//! Command execution functions for bundler operations.

mod plan;
mod publish;
mod resolve;

pub use plan::execute_plan;
pub use publish::execute_publish;
pub use resolve::execute_resolve;

use super::{Args, Command, Target};
use crate::{
    bundler::{Project, UpstreamLoader, load_project, platform::load_platform},
    error::Result,
};
use std::path::Path;

/// Runs the parsed command. Returns the process exit code.
pub async fn execute(args: &Args) -> Result<i32> {
    match &args.command {
        Command::Plan {
            target,
            force_signing,
            no_notarize,
            json,
        } => execute_plan(&args.configdir, target, *force_signing, *no_notarize, *json).await,
        Command::Resolve {
            target,
            component,
            build_dependencies,
        } => execute_resolve(&args.configdir, target, component.as_deref(), *build_dependencies).await,
        Command::Publish { target, output } => execute_publish(&args.configdir, target, output).await,
    }
}

/// Loads the target's platform and project from `configdir`.
pub async fn load_target(configdir: &Path, target: &Target) -> Result<Project> {
    let platform = load_platform(&target.platform, &configdir.join("platforms")).await?;
    let loader = UpstreamLoader::new();
    let project = load_project(
        &target.project,
        configdir,
        platform,
        target.component_filter(),
        &loader,
    )
    .await?;
    log::debug!(
        "Loaded project {} with {} components and {} settings",
        project.name,
        project.components.len(),
        project.settings.len()
    );
    Ok(project)
}
