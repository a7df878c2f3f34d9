//! `plan`: print the packaging commands.

use super::load_target;
use crate::{
    bundler::{Bundler, settings::BuildToggles},
    cli::Target,
    error::Result,
};
use std::path::Path;

/// Prints the plan, one command per line or as a JSON array.
///
/// Command line flags can only switch toggles on; the environment still
/// applies when a flag is absent.
pub async fn execute_plan(
    configdir: &Path,
    target: &Target,
    force_signing: bool,
    no_notarize: bool,
    json: bool,
) -> Result<i32> {
    let project = load_target(configdir, target).await?;

    let env = BuildToggles::from_env();
    let toggles = BuildToggles {
        force_signing: env.force_signing || force_signing,
        skip_notarization: env.skip_notarization || no_notarize,
    };

    let bundler = Bundler::new(project, toggles);
    let commands = bundler.plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&commands)?);
    } else {
        for command in &commands {
            println!("{command}");
        }
    }
    Ok(0)
}
