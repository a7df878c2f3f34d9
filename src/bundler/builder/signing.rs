//! Extra-file signing over ssh and rsync.
//!
//! Some projects ship files that must be signed on a dedicated host. For each
//! such file the signer emits five commands: reset the remote sign script,
//! append the rendered signing line, copy the file over, run the script, and
//! copy the signed file back over the original.

use crate::bundler::{
    Error, Result,
    builder::runner::{CommandRunner, ShellRunner, capture_with_retries},
    platform::PlatformFamily,
    project::Project,
    settings::file_basename,
};

/// Environment variable overriding the ssh port.
pub const SSH_PORT_ENV: &str = "KODEGEN_SSH_PORT";

/// Environment variable naming an ssh identity file.
pub const SSH_KEY_ENV: &str = "KODEGEN_SSH_KEY";

const PROBE_ATTEMPTS: u32 = 3;
const SIGN_SCRIPT: &str = "sign_extra_file";
const RSYNC_FLAGS: &str = "--verbose --recursive --hard-links --links --no-perms --no-owner --no-group";

/// ssh transport options shared by the probe, remote commands and rsync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SshOptions {
    pub port: u16,
    pub key: Option<String>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self { port: 22, key: None }
    }
}

impl SshOptions {
    /// Reads `KODEGEN_SSH_PORT` and `KODEGEN_SSH_KEY`.
    pub fn from_env() -> Self {
        let port = match std::env::var(SSH_PORT_ENV) {
            Ok(value) => value.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid {}={:?}, using port 22", SSH_PORT_ENV, value);
                22
            }),
            Err(_) => 22,
        };
        let key = std::env::var(SSH_KEY_ENV).ok().filter(|k| !k.is_empty());
        Self { port, key }
    }

    /// The ssh invocation prefix. An unset key leaves an empty slot.
    pub fn ssh_command(&self) -> String {
        let identity = self.key.as_ref().map(|key| format!("-i {key}")).unwrap_or_default();
        format!(
            "/usr/bin/ssh -p {} {} -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no",
            self.port, identity
        )
    }
}

/// Builds the command sequence that signs a project's extra files.
pub struct ExtraFilesSigner {
    runner: Box<dyn CommandRunner>,
    ssh: SshOptions,
}

impl std::fmt::Debug for ExtraFilesSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtraFilesSigner")
            .field("runner", &"<dyn CommandRunner>")
            .field("ssh", &self.ssh)
            .finish()
    }
}

impl Default for ExtraFilesSigner {
    fn default() -> Self {
        Self::new(Box::new(ShellRunner::default()), SshOptions::from_env())
    }
}

impl ExtraFilesSigner {
    pub fn new(runner: Box<dyn CommandRunner>, ssh: SshOptions) -> Self {
        Self { runner, ssh }
    }

    pub fn ssh(&self) -> &SshOptions {
        &self.ssh
    }

    /// Commands signing every extra file of `project`, in declaration order.
    ///
    /// `mktemp` is run on the signing host (or locally for local signing) to
    /// obtain the remote work directory. `source_dir` is the staged tree the
    /// files live under, relative to `$(tempdir)`.
    ///
    /// Returns an empty list without probing when there is nothing to sign.
    /// An unreachable host is logged and yields an empty list unless
    /// `force_signing` is set, in which case it is an error.
    pub fn commands(
        &self,
        project: &Project,
        force_signing: bool,
        mktemp: &str,
        source_dir: &str,
    ) -> Result<Vec<String>> {
        let signing = &project.signing;
        if signing.extra_files.is_empty() {
            return Ok(Vec::new());
        }

        let local = signing.use_local_signing;
        let target = if local {
            "localhost".to_string()
        } else {
            signing.remote_target()
        };

        let tempdir = match self.probe(&target, mktemp, local) {
            Ok(dir) => dir,
            Err(e) => {
                log::error!(
                    "Unable to connect to {}, skipping signing extra files: {}",
                    target,
                    e
                );
                if force_signing {
                    return Err(Error::SigningHostUnreachable {
                        target,
                        reason: e.to_string(),
                    });
                }
                return Ok(Vec::new());
            }
        };

        let preserve_xattrs = project.platform().family() == PlatformFamily::MacOs;
        let mut commands = Vec::with_capacity(signing.extra_files.len() * 5);

        for file in &signing.extra_files {
            let remote_file = format!("{tempdir}/{}", file_basename(file));
            let local_path = join_path(&["$(tempdir)", source_dir, file]);
            let line = signing.render_line(&remote_file);
            let script = format!("{tempdir}/{SIGN_SCRIPT}");

            if local {
                commands.push(format!("echo > {script}"));
                commands.push(format!("echo '{line}' >> {script}"));
                commands.push(self.rsync(None, preserve_xattrs, &local_path, &tempdir));
                commands.push(format!("/bin/bash {script}"));
                commands.push(self.rsync(None, preserve_xattrs, &remote_file, &local_path));
            } else {
                let ssh = self.ssh.ssh_command();
                commands.push(format!("{ssh} {target} \"echo > {script}\""));
                commands.push(format!("{ssh} {target} \"echo '{line}' >> {script}\""));
                commands.push(self.rsync(
                    Some(&ssh),
                    preserve_xattrs,
                    &local_path,
                    &format!("{target}:{tempdir}"),
                ));
                commands.push(format!("{ssh} {target} /bin/bash {script}"));
                commands.push(self.rsync(
                    Some(&ssh),
                    preserve_xattrs,
                    &format!("{target}:{remote_file}"),
                    &local_path,
                ));
            }
        }

        Ok(commands)
    }

    fn probe(&self, target: &str, mktemp: &str, local: bool) -> Result<String> {
        let probe = if local {
            format!("{mktemp} 2>/dev/null")
        } else {
            format!("{} {target} '{mktemp} 2>/dev/null'", self.ssh.ssh_command())
        };
        let output = capture_with_retries(self.runner.as_ref(), &probe, PROBE_ATTEMPTS)?;
        let dir = output.trim();
        if dir.is_empty() {
            return Err(Error::GenericError(format!(
                "`{probe}` did not report a temporary directory"
            )));
        }
        Ok(dir.to_string())
    }

    fn rsync(&self, ssh: Option<&str>, preserve_xattrs: bool, from: &str, to: &str) -> String {
        let xattrs = if preserve_xattrs { "--extended-attributes" } else { "" };
        match ssh {
            Some(ssh) => format!("rsync -e '{ssh}' {RSYNC_FLAGS} {xattrs} {from} {to}"),
            None => format!("rsync {RSYNC_FLAGS} {xattrs} {from} {to}"),
        }
    }
}

/// Joins path segments with exactly one `/` between them.
fn join_path(segments: &[&str]) -> String {
    let mut joined = String::new();
    for segment in segments {
        let segment = if joined.is_empty() {
            segment.trim_end_matches('/')
        } else {
            segment.trim_matches('/')
        };
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::platform::load_platform_named;
    use serial_test::serial;
    use std::sync::{Arc, Mutex};

    const SSH: &str =
        "/usr/bin/ssh -p 22  -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no";

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        reachable: bool,
    }

    impl CommandRunner for Recorder {
        fn capture(&self, command: &str) -> Result<String> {
            self.calls.lock().unwrap().push(command.to_string());
            if self.reachable {
                Ok("/tmp/xyz\n".to_string())
            } else {
                Err(Error::GenericError("connection refused".into()))
            }
        }
    }

    fn project(platform: &str, files: &[&str]) -> Project {
        let mut project = Project::new("test-fixture", load_platform_named(platform).unwrap());
        project.version = Some("0.0.0".into());
        project.signing.hostname = Some("abc".into());
        project.signing.username = Some("test".into());
        project.signing.commands = vec!["codesign %{file}".into()];
        project.signing.extra_files = files.iter().map(|f| f.to_string()).collect();
        project
    }

    fn signer(reachable: bool) -> (ExtraFilesSigner, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder {
            reachable,
            ..Default::default()
        };
        let calls = recorder.calls.clone();
        (
            ExtraFilesSigner::new(Box::new(recorder), SshOptions::default()),
            calls,
        )
    }

    #[test]
    fn no_extra_files_means_no_probe() {
        let (signer, calls) = signer(true);
        let project = project("osx-11-x86_64", &[]);
        let commands = signer
            .commands(&project, true, "/tmp/xyz", "/dir/source_dir")
            .unwrap();
        assert!(commands.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn two_files_on_macos_yield_ten_commands_in_order() {
        let (signer, calls) = signer(true);
        let project = project("osx-11-x86_64", &["/test1/a.rb", "/test2/b.rb"]);
        let commands = signer
            .commands(&project, false, "/tmp/xyz", "/dir/source_dir")
            .unwrap();

        let rsync = format!(
            "rsync -e '{SSH}' --verbose --recursive --hard-links --links --no-perms --no-owner --no-group --extended-attributes"
        );
        let expected = vec![
            format!("{SSH} test@abc \"echo > /tmp/xyz/sign_extra_file\""),
            format!("{SSH} test@abc \"echo 'codesign /tmp/xyz/a.rb' >> /tmp/xyz/sign_extra_file\""),
            format!("{rsync} $(tempdir)/dir/source_dir/test1/a.rb test@abc:/tmp/xyz"),
            format!("{SSH} test@abc /bin/bash /tmp/xyz/sign_extra_file"),
            format!("{rsync} test@abc:/tmp/xyz/a.rb $(tempdir)/dir/source_dir/test1/a.rb"),
            format!("{SSH} test@abc \"echo > /tmp/xyz/sign_extra_file\""),
            format!("{SSH} test@abc \"echo 'codesign /tmp/xyz/b.rb' >> /tmp/xyz/sign_extra_file\""),
            format!("{rsync} $(tempdir)/dir/source_dir/test2/b.rb test@abc:/tmp/xyz"),
            format!("{SSH} test@abc /bin/bash /tmp/xyz/sign_extra_file"),
            format!("{rsync} test@abc:/tmp/xyz/b.rb $(tempdir)/dir/source_dir/test2/b.rb"),
        ];
        assert_eq!(commands, expected);
        assert_eq!(
            calls.lock().unwrap().as_slice(),
            [format!("{SSH} test@abc '/tmp/xyz 2>/dev/null'")]
        );
    }

    #[test]
    fn other_platforms_skip_extended_attributes() {
        let (signer, _) = signer(true);
        let project = project("windows-2012r2-x86_64", &["/test1/a.rb"]);
        let commands = signer
            .commands(&project, false, "/tmp/xyz", "/dir/source_dir")
            .unwrap();
        assert_eq!(
            commands[2],
            format!(
                "rsync -e '{SSH}' --verbose --recursive --hard-links --links --no-perms --no-owner --no-group  $(tempdir)/dir/source_dir/test1/a.rb test@abc:/tmp/xyz"
            )
        );
    }

    #[test]
    fn unreachable_host_is_skipped_unless_forced() {
        let (signer, calls) = signer(false);
        let project = project("osx-11-x86_64", &["/test1/a.rb", "/test2/b.rb"]);

        let commands = signer
            .commands(&project, false, "/tmp/xyz", "/dir/source_dir")
            .unwrap();
        assert!(commands.is_empty());
        assert_eq!(calls.lock().unwrap().len(), PROBE_ATTEMPTS as usize);

        let err = signer
            .commands(&project, true, "/tmp/xyz", "/dir/source_dir")
            .unwrap_err();
        assert!(matches!(err, Error::SigningHostUnreachable { ref target, .. } if target == "test@abc"));
    }

    #[test]
    fn local_signing_runs_without_ssh() {
        let (signer, calls) = signer(true);
        let mut project = project("osx-11-x86_64", &["/test1/a.rb"]);
        project.signing.use_local_signing = true;
        let commands = signer
            .commands(&project, false, "/tmp/xyz", "/dir/source_dir")
            .unwrap();

        assert_eq!(commands.len(), 5);
        assert_eq!(commands[0], "echo > /tmp/xyz/sign_extra_file");
        assert_eq!(commands[1], "echo 'codesign /tmp/xyz/a.rb' >> /tmp/xyz/sign_extra_file");
        assert!(commands[2].starts_with("rsync --verbose"));
        assert!(commands[2].ends_with("$(tempdir)/dir/source_dir/test1/a.rb /tmp/xyz"));
        assert_eq!(commands[3], "/bin/bash /tmp/xyz/sign_extra_file");
        assert!(commands[4].ends_with("/tmp/xyz/a.rb $(tempdir)/dir/source_dir/test1/a.rb"));
        assert_eq!(calls.lock().unwrap().as_slice(), ["/tmp/xyz 2>/dev/null"]);
    }

    #[test]
    fn relative_extra_files_are_joined_under_the_source_dir() {
        let (signer, _) = signer(true);
        let project = project("osx-11-x86_64", &["bin/tool.exe"]);
        let commands = signer
            .commands(&project, false, "/tmp/xyz", "/SourceDir")
            .unwrap();
        assert!(commands[2].ends_with(" $(tempdir)/SourceDir/bin/tool.exe test@abc:/tmp/xyz"));
        assert!(commands[4].ends_with("test@abc:/tmp/xyz/tool.exe $(tempdir)/SourceDir/bin/tool.exe"));
    }

    #[test]
    fn path_segments_join_with_single_separators() {
        assert_eq!(
            join_path(&["$(tempdir)", "/SourceDir/", "/bin/tool.exe"]),
            "$(tempdir)/SourceDir/bin/tool.exe"
        );
        assert_eq!(join_path(&["$(tempdir)", "", "a.rb"]), "$(tempdir)/a.rb");
    }

    #[test]
    #[serial]
    fn ssh_options_read_the_environment() {
        temp_env::with_vars([(SSH_PORT_ENV, Some("2200")), (SSH_KEY_ENV, Some("/keys/id"))], || {
            assert_eq!(
                SshOptions::from_env(),
                SshOptions {
                    port: 2200,
                    key: Some("/keys/id".into())
                }
            );
        });
        temp_env::with_vars([(SSH_PORT_ENV, Some("not-a-port")), (SSH_KEY_ENV, Some(""))], || {
            assert_eq!(SshOptions::from_env(), SshOptions::default());
        });
        temp_env::with_vars_unset([SSH_PORT_ENV, SSH_KEY_ENV], || {
            assert_eq!(SshOptions::from_env(), SshOptions::default());
        });
    }

    #[test]
    fn identity_file_is_passed_to_ssh() {
        let ssh = SshOptions {
            port: 2222,
            key: Some("/keys/id".into()),
        };
        assert_eq!(
            ssh.ssh_command(),
            "/usr/bin/ssh -p 2222 -i /keys/id -o UserKnownHostsFile=/dev/null -o StrictHostKeyChecking=no"
        );
    }
}
