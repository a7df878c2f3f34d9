//! Build metadata written alongside packages.
//!
//! Every build records which tool produced it, the project version, and the
//! version (and source ref, when known) of each component. The manifest is
//! saved twice under `ext/`: once under a fixed name read by older tooling,
//! and once qualified by project and platform.

use crate::bundler::{ErrorExt, Result, project::Project, utils::fs::create_dir_all};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::LazyLock,
};

/// Timestamp shared by every manifest written by this process.
pub static BUILD_TIME: LazyLock<String> = LazyLock::new(|| chrono::Local::now().to_rfc3339());

/// Name and version recorded as the packaging tool.
pub const PACKAGING_TOOL: &str = env!("CARGO_PKG_NAME");
pub const PACKAGING_TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version and source ref of one component. Absent fields are omitted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

/// Contents of `ext/build_metadata.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub packaging_type: BTreeMap<String, String>,
    pub version: Option<String>,
    pub components: BTreeMap<String, DependencyInfo>,
    pub build_time: String,
}

impl BuildManifest {
    /// Manifest for `project`, stamped with [`BUILD_TIME`].
    pub fn for_project(project: &Project) -> Self {
        Self::with_build_time(project, BUILD_TIME.as_str())
    }

    pub fn with_build_time(project: &Project, build_time: &str) -> Self {
        Self {
            packaging_type: BTreeMap::from([(
                PACKAGING_TOOL.to_string(),
                PACKAGING_TOOL_VERSION.to_string(),
            )]),
            version: project.version.clone(),
            components: project.dependencies_info(),
            build_time: build_time.to_string(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        Ok(if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        })
    }
}

/// Writes the manifest to `<dir>/ext/build_metadata.json` and
/// `<dir>/ext/build_metadata.<project>.<platform>.json`.
pub async fn save_manifest_json(project: &Project, dir: &Path) -> Result<Vec<PathBuf>> {
    let ext = dir.join("ext");
    create_dir_all(&ext).await?;

    let json = BuildManifest::for_project(project).to_json(true)?;
    let paths = vec![
        ext.join("build_metadata.json"),
        ext.join(format!(
            "build_metadata.{}.{}.json",
            project.name,
            project.platform().name()
        )),
    ];

    for path in &paths {
        tokio::fs::write(path, &json)
            .await
            .fs_context("writing build metadata", path)?;
        log::debug!("Wrote build metadata to {}", path.display());
    }

    Ok(paths)
}
