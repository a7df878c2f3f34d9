//! Components and their on-disk descriptions.

use crate::bundler::{Error, ErrorExt, Result, settings::SettingValue};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

/// A named unit of source with declared build-time requirements.
///
/// `build_requires` may name other components of the same project or
/// packages from the build host; only the former take part in resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub version: Option<String>,
    pub build_requires: Vec<String>,
    /// Directories this component installs into, packaged with the project.
    pub directories: Vec<String>,
    pub options: BTreeMap<String, SettingValue>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Appends build requirements, keeping declaration order.
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.build_requires.extend(names.into_iter().map(Into::into));
        self
    }

    /// Source ref recorded in the build manifest, from the `ref` option.
    pub fn source_ref(&self) -> Option<&str> {
        self.options.get("ref").and_then(SettingValue::as_str)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ComponentFile {
    name: Option<String>,
    version: Option<String>,
    build_requires: Vec<String>,
    directories: Vec<String>,
    options: BTreeMap<String, SettingValue>,
}

/// Loads `<components_dir>/<name>.toml`.
pub async fn load_component(name: &str, components_dir: &Path) -> Result<Component> {
    let path = components_dir.join(format!("{name}.toml"));
    let content = tokio::fs::read_to_string(&path)
        .await
        .fs_context("reading component description", &path)?;
    let file: ComponentFile = toml::from_str(&content).map_err(|e| Error::InvalidDescription {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    if let Some(declared) = file.name.as_deref().filter(|n| *n != name) {
        return Err(Error::InvalidDescription {
            path,
            reason: format!("declares component '{declared}' but was loaded as '{name}'"),
        });
    }

    log::debug!("Loaded component {} from {}", name, path.display());
    Ok(Component {
        name: name.to_string(),
        version: file.version,
        build_requires: file.build_requires,
        directories: file.directories,
        options: file.options,
    })
}
