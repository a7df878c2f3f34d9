//! Published settings snapshots: a YAML map plus a SHA-1 companion file.

use super::{SettingValue, SettingsStore};
use crate::bundler::{
    builder::checksum::sha1_hex,
    error::{Error, Result},
};
use std::collections::BTreeMap;

/// Extension appended to a snapshot path to find its checksum file.
pub const CHECKSUM_EXTENSION: &str = "sha1";

/// Serializes settings as a YAML snapshot.
pub fn to_yaml(settings: &SettingsStore) -> Result<String> {
    Ok(serde_yaml::to_string(settings.as_map())?)
}

/// Parses a YAML snapshot into a key/value map.
///
/// Keys written as Ruby-style symbols (`:key`) are normalised to `key`.
pub fn parse_yaml(content: &[u8]) -> Result<BTreeMap<String, SettingValue>> {
    let raw: BTreeMap<String, SettingValue> = serde_yaml::from_slice(content)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| match key.strip_prefix(':') {
            Some(stripped) => (stripped.to_string(), value),
            None => (key, value),
        })
        .collect())
}

/// Renders the checksum file body for a snapshot.
pub fn checksum_file_content(yaml: &str) -> String {
    format!("{}\n", sha1_hex(yaml.as_bytes()))
}

/// Extracts the digest from a checksum file.
///
/// Accepts both a bare digest and `sha1sum` output (`<digest>  <file>`).
pub fn parse_checksum_file(content: &str) -> Option<String> {
    content
        .split_whitespace()
        .next()
        .filter(|digest| digest.len() == 40 && digest.chars().all(|c| c.is_ascii_hexdigit()))
        .map(str::to_ascii_lowercase)
}

/// Checks `content` against the digest found in `checksum_file`.
pub fn verify(uri: &str, content: &[u8], checksum_file: &str) -> Result<()> {
    let expected = parse_checksum_file(checksum_file).ok_or_else(|| Error::ChecksumUnavailable {
        uri: uri.to_string(),
        reason: "checksum file does not contain a sha1 digest".to_string(),
    })?;
    let actual = sha1_hex(content);
    if expected != actual {
        return Err(Error::ChecksumMismatch {
            uri: uri.to_string(),
            expected,
            actual,
        });
    }
    log::info!("Verified sha1 {} for {}", actual, uri);
    Ok(())
}
