//! Code-signing sweep over staged executables, libraries and plugins.
//!
//! Notarization requires every Mach-O file in the package to be signed, so
//! rather than list files one by one the plan runs `find` over a table of
//! (directory, name pattern) pairs, signing every match and then verifying
//! every match. A failed verification fails the build.

use crate::bundler::project::{BinarySigningPath, Project};

/// Directories swept for binaries, relative to the macOS build directory.
///
/// Projects may replace the table with `binary_signing_path` directives.
pub fn binary_signing_table(project: &Project, version: &str) -> Vec<BinarySigningPath> {
    if !project.binary_signing_paths.is_empty() {
        return project.binary_signing_paths.clone();
    }

    let name = &project.name;
    let root = format!("root/{name}-{version}/opt/{name}");
    vec![
        BinarySigningPath::new(format!("{root}/bin/"), "*"),
        BinarySigningPath::new(format!("{root}/lib/"), "*.dylib"),
        BinarySigningPath::new(format!("{root}/lib"), "*.bundle"),
        BinarySigningPath::new("plugins", format!("{name}-installer-plugin")),
    ]
}

/// Unlocks the keychain, signs every match, then verifies every match.
pub fn sign_binaries_commands(table: &[BinarySigningPath], build_dir: &str, unlock: &str) -> Vec<String> {
    let sign = table.iter().map(|entry| {
        format!(
            "find {build_dir}/{} -name '{}' -type f -exec codesign --timestamp --options runtime --keychain $$SIGNING_KEYCHAIN -vfs \"$$APPLICATION_SIGNING_CERT\" {{}} \\;",
            entry.path, entry.pattern
        )
    });
    let verify = table.iter().map(|entry| {
        format!(
            "find {build_dir}/{} -name '{}' -type f -exec codesign --verify --strict --verbose=2 {{}} \\;",
            entry.path, entry.pattern
        )
    });

    std::iter::once(unlock.to_string()).chain(sign).chain(verify).collect()
}
