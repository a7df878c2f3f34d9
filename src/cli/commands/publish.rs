//! `publish`: write build metadata and the settings snapshot.

use super::load_target;
use crate::{
    bundler::{Bundler, builder::checksum::sha1_file, settings::BuildToggles},
    cli::Target,
    error::Result,
};
use std::path::Path;

/// Prints `<sha1>  <path>` for every file written, like `sha1sum`.
pub async fn execute_publish(configdir: &Path, target: &Target, output: &Path) -> Result<i32> {
    let project = load_target(configdir, target).await?;
    let bundler = Bundler::new(project, BuildToggles::default());
    for path in bundler.publish(output).await? {
        println!("{}  {}", sha1_file(&path).await?, path.display());
    }
    Ok(0)
}
