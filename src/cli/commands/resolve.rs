//! `resolve`: print the build order.

use super::load_target;
use crate::{
    bundler::{Bundler, settings::BuildToggles},
    cli::Target,
    error::{CliError, Result},
};
use std::path::Path;

pub async fn execute_resolve(
    configdir: &Path,
    target: &Target,
    component: Option<&str>,
    build_dependencies: bool,
) -> Result<i32> {
    let project = load_target(configdir, target).await?;

    if build_dependencies {
        if let Some(command) = project.install_build_dependencies() {
            println!("{command}");
        }
        return Ok(0);
    }

    if let Some(name) = component
        && !project.components.contains(name)
    {
        return Err(CliError::InvalidArguments {
            reason: format!("project {} has no component '{}'", project.name, name),
        }
        .into());
    }

    let bundler = Bundler::new(project, BuildToggles::default());
    for component in bundler.resolve(component) {
        match &component.version {
            Some(version) => println!("{} {}", component.name, version),
            None => println!("{}", component.name),
        }
    }
    Ok(0)
}
