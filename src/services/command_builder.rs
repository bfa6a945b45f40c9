//! Argument vectors for the `ssh` and `rsync` clients.
//!
//! Nothing here runs a process. Inputs are passed as discrete arguments; the
//! only text that is ever interpreted by a shell is the remote command line,
//! which `sshd` hands to the remote user's shell.

use crate::constants::programs::{REMOTE_SHELL, RSYNC, RSYNC_ARCHIVE_FLAGS, SSH};
use crate::errors::BrokerError;
use crate::utils::paths::normalize_env_value;
use crate::utils::user_paths::absolutize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "to-remote")]
    ToRemote,
    #[serde(rename = "from-remote")]
    FromRemote,
}

impl Direction {
    pub const ALL: [&'static str; 2] = ["to-remote", "from-remote"];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "to-remote" => Some(Direction::ToRemote),
            "from-remote" => Some(Direction::FromRemote),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ToRemote => "to-remote",
            Direction::FromRemote => "from-remote",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wraps `text` in single quotes for a POSIX shell; every embedded `'`
/// becomes `'\''`.
pub fn quote_single(text: &str) -> String {
    format!("'{}'", text.replace('\'', "'\\''"))
}

/// Quotes one word of an rsync `-e` value. rsync splits that value itself,
/// without a shell: inside single quotes a doubled `''` is a literal quote
/// and backslash has no special meaning.
pub fn quote_rsync_word(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    ssh_program: String,
    rsync_program: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new(SSH, RSYNC)
    }
}

impl CommandBuilder {
    pub fn new(ssh_program: impl Into<String>, rsync_program: impl Into<String>) -> Self {
        Self {
            ssh_program: ssh_program.into(),
            rsync_program: rsync_program.into(),
        }
    }

    /// `ssh -i <key> <user>@<host> "bash -ic '<command>'"`
    pub fn remote_command(
        &self,
        key_path: &str,
        username: &str,
        host: &str,
        command: &str,
    ) -> Vec<String> {
        vec![
            self.ssh_program.clone(),
            "-i".to_string(),
            key_path.to_string(),
            format!("{}@{}", username, host),
            format!("{} -ic {}", REMOTE_SHELL, quote_single(command)),
        ]
    }

    /// `rsync -avz -e "'ssh' -i '<key>'" <source> <destination>`, with the
    /// operands ordered by `direction`.
    pub fn transfer_command(
        &self,
        key_path: &str,
        username: &str,
        host: &str,
        local_path: &str,
        remote_path: &str,
        direction: Direction,
    ) -> Result<Vec<String>, BrokerError> {
        let local = absolute_local_path(local_path)?;
        let remote = format!("{}@{}:{}", username, host, remote_path);
        let (source, destination) = match direction {
            Direction::ToRemote => (local, remote),
            Direction::FromRemote => (remote, local),
        };
        Ok(vec![
            self.rsync_program.clone(),
            RSYNC_ARCHIVE_FLAGS.to_string(),
            "-e".to_string(),
            format!(
                "{} -i {}",
                quote_rsync_word(&self.ssh_program),
                quote_rsync_word(key_path)
            ),
            source,
            destination,
        ])
    }
}

fn absolute_local_path(local_path: &str) -> Result<String, BrokerError> {
    let absolute = absolutize(Path::new(local_path)).map_err(|err| {
        BrokerError::invalid_input(format!("Cannot resolve localPath {}: {}", local_path, err))
    })?;
    let mut rendered = absolute
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| BrokerError::invalid_input("localPath must be valid UTF-8"))?;
    // rsync copies directory contents, not the directory itself, when the
    // source carries a trailing slash.
    if local_path.ends_with('/') && !rendered.ends_with('/') {
        rendered.push('/');
    }
    Ok(rendered)
}

fn resolve_program(keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .find_map(|key| normalize_env_value(std::env::var(key).ok()))
        .unwrap_or_else(|| fallback.to_string())
}

pub fn resolve_ssh_program() -> String {
    resolve_program(&["SSH_BROKER_SSH_BIN"], SSH)
}

pub fn resolve_rsync_program() -> String {
    resolve_program(&["SSH_BROKER_RSYNC_BIN"], RSYNC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn shell_roundtrip(quoted: &str) -> String {
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!("printf '%s' {}", quoted))
            .output()
            .expect("run sh");
        String::from_utf8(output.stdout).expect("utf8")
    }

    #[test]
    fn quote_single_escapes_embedded_quotes() {
        assert_eq!(quote_single("echo 'hi'"), r#"'echo '\''hi'\'''"#);
        assert_eq!(quote_single(""), "''");
    }

    #[test]
    fn quoted_text_reads_back_verbatim_through_a_shell() {
        for input in [
            "echo 'hi'",
            "it's",
            "'",
            "''",
            "a'b'c",
            "echo \"$HOME\" && ls | wc -l",
            "x; rm -rf /tmp/nothing-here",
            "tab\there",
        ] {
            assert_eq!(shell_roundtrip(&quote_single(input)), input, "input: {}", input);
        }
    }

    #[test]
    fn remote_command_shape() {
        let argv = CommandBuilder::default().remote_command(
            "/keys/id_ed25519",
            "deploy",
            "10.0.0.5",
            "echo 'hi'",
        );
        assert_eq!(
            argv,
            vec![
                "ssh",
                "-i",
                "/keys/id_ed25519",
                "deploy@10.0.0.5",
                r#"bash -ic 'echo '\''hi'\'''"#,
            ]
        );
        let quoted = argv[4].strip_prefix("bash -ic ").expect("login shell wrapper");
        assert_eq!(shell_roundtrip(quoted), "echo 'hi'");
    }

    #[test]
    fn transfer_to_remote_puts_local_first() {
        let argv = CommandBuilder::default()
            .transfer_command(
                "/keys/id",
                "deploy",
                "box1",
                "/srv/build",
                "/opt/app",
                Direction::ToRemote,
            )
            .expect("argv");
        assert_eq!(
            argv,
            vec![
                "rsync",
                "-avz",
                "-e",
                "'ssh' -i '/keys/id'",
                "/srv/build",
                "deploy@box1:/opt/app",
            ]
        );
    }

    #[test]
    fn transfer_from_remote_reverses_operands() {
        let argv = CommandBuilder::default()
            .transfer_command(
                "/keys/id",
                "deploy",
                "box1",
                "/srv/backup",
                "/var/log/app.log",
                Direction::FromRemote,
            )
            .expect("argv");
        assert_eq!(argv[4], "deploy@box1:/var/log/app.log");
        assert_eq!(argv[5], "/srv/backup");
    }

    #[test]
    fn transfer_resolves_relative_local_paths() {
        let cwd = std::env::current_dir().expect("cwd");
        let argv = CommandBuilder::default()
            .transfer_command("/k", "u", "h", "out/", "/r", Direction::FromRemote)
            .expect("argv");
        assert_eq!(argv[5], format!("{}/", cwd.join("out").display()));
    }

    #[test]
    fn remote_shell_option_uses_rsync_quoting() {
        let argv = CommandBuilder::new("/opt/my ssh/bin/ssh", "rsync")
            .transfer_command(
                "/home/me/my keys/it's",
                "u",
                "h",
                "/l",
                "/r",
                Direction::ToRemote,
            )
            .expect("argv");
        assert_eq!(
            argv[3],
            "'/opt/my ssh/bin/ssh' -i '/home/me/my keys/it''s'"
        );
    }

    #[test]
    fn rsync_word_quoting_doubles_quotes_and_keeps_backslashes() {
        assert_eq!(quote_rsync_word("it's"), "'it''s'");
        assert_eq!(quote_rsync_word("a\\b"), "'a\\b'");
        assert_eq!(quote_rsync_word(""), "''");
    }

    #[test]
    fn direction_parse_accepts_only_catalog_values() {
        assert_eq!(Direction::parse("to-remote"), Some(Direction::ToRemote));
        assert_eq!(Direction::parse("from-remote"), Some(Direction::FromRemote));
        assert_eq!(Direction::parse("FROM_REMOTE"), None);
        assert_eq!(Direction::parse("sideways"), None);
    }
}
