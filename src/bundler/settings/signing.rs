//! Extra-file signing configuration.

use std::path::Path;

/// Placeholder replaced by the remote path of the file being signed.
pub const FILE_PLACEHOLDER: &str = "%{file}";

/// Where and how extra files get signed.
///
/// Only consulted when at least one extra file is declared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SigningSettings {
    /// Host that runs the signing commands.
    pub hostname: Option<String>,

    /// User to log in to `hostname` as.
    pub username: Option<String>,

    /// Signing command templates, each containing [`FILE_PLACEHOLDER`].
    pub commands: Vec<String>,

    /// Files (relative to the staged source tree) to sign, in declaration order.
    pub extra_files: Vec<String>,

    /// Run the signing commands on this machine instead of over ssh.
    pub use_local_signing: bool,
}

impl SigningSettings {
    /// `user@host` for ssh and rsync, or just the host when no user is set.
    pub fn remote_target(&self) -> String {
        let host = self.hostname.as_deref().unwrap_or("localhost");
        match self.username.as_deref() {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        }
    }

    /// Renders every command template for `remote_file` into one script line.
    ///
    /// Templates without a placeholder get the path appended.
    pub fn render_line(&self, remote_file: &str) -> String {
        self.commands
            .iter()
            .map(|template| {
                if template.contains(FILE_PLACEHOLDER) {
                    template.replace(FILE_PLACEHOLDER, remote_file)
                } else {
                    format!("{template} {remote_file}")
                }
            })
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

/// Final path component of an extra file, as it lands in the signing temp dir.
pub fn file_basename(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholder() {
        let signing = SigningSettings {
            commands: vec!["codesign %{file}".into()],
            ..Default::default()
        };
        assert_eq!(signing.render_line("/tmp/xyz/a.rb"), "codesign /tmp/xyz/a.rb");
    }

    #[test]
    fn joins_multiple_templates() {
        let signing = SigningSettings {
            commands: vec!["signtool sign %{file}".into(), "signtool verify".into()],
            ..Default::default()
        };
        assert_eq!(
            signing.render_line("C:/t/a.exe"),
            "signtool sign C:/t/a.exe && signtool verify C:/t/a.exe"
        );
    }

    #[test]
    fn remote_target_includes_user() {
        let signing = SigningSettings {
            hostname: Some("abc".into()),
            username: Some("test".into()),
            ..Default::default()
        };
        assert_eq!(signing.remote_target(), "test@abc");
        assert_eq!(file_basename("/test1/a.rb"), "a.rb");
    }
}
