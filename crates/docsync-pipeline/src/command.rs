//! External command invocation.
//!
//! Commands are argument vectors, never shell strings, so paths and branch
//! names need no quoting.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Create a command from a program and arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a command from a full argument vector (`argv[0]` is the program).
    pub fn from_argv(argv: &[String]) -> Result<Self, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyArgv)?;
        Ok(Self::new(program.clone(), args.iter().cloned()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, if the process exited normally
    pub code: Option<i32>,

    /// Whether the process exited with status zero
    pub success: bool,

    /// Raw standard output
    pub stdout: Vec<u8>,

    /// Raw standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Exit code for messages, `signal` when the process was killed.
    pub fn status_label(&self) -> String {
        self.code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

/// Errors from running an external command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Command is empty")]
    EmptyArgv,

    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}\n{stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// Run a command to completion and capture its output, whatever its exit status.
///
/// When `stdin` is given it is written to the child's standard input, which is
/// closed afterwards.
pub async fn capture(
    spec: &CommandSpec,
    cwd: &Path,
    stdin: Option<&[u8]>,
) -> Result<CommandOutput, CommandError> {
    tracing::debug!("Running `{}` in {}", spec, cwd.display());

    let spawn_error = |source| CommandError::Spawn {
        command: spec.to_string(),
        source,
    };

    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(mut pipe), Some(input)) = (pipe, stdin) {
            pipe.write_all(input).await?;
            pipe.shutdown().await?;
        }
        Ok::<_, std::io::Error>(())
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(spawn_error)?;
    // A child that exits early closes its stdin; its status says why.
    if output.status.success() {
        fed.map_err(spawn_error)?;
    }

    Ok(CommandOutput {
        code: output.status.code(),
        success: output.status.success(),
        stdout: output.stdout,
        stderr: output.stderr,
    })
}

/// Run a command and fail unless it exits successfully.
pub async fn run(
    spec: &CommandSpec,
    cwd: &Path,
    stdin: Option<&[u8]>,
) -> Result<CommandOutput, CommandError> {
    let output = capture(spec, cwd, stdin).await?;

    if !output.success {
        return Err(CommandError::Failed {
            command: spec.to_string(),
            status: output.status_label(),
            stderr: output.stderr_text().trim().to_string(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn displays_quoted_arguments() {
        let spec = CommandSpec::new("pkill", ["-f", "docusaurus start"]);

        assert_eq!(spec.to_string(), "pkill -f \"docusaurus start\"");
    }

    #[test]
    fn builds_from_argv() {
        let argv = vec!["npm".to_string(), "run".to_string(), "build".to_string()];

        let spec = CommandSpec::from_argv(&argv).unwrap();

        assert_eq!(spec.program(), "npm");
        assert_eq!(spec.args(), ["run", "build"]);
        assert!(matches!(
            CommandSpec::from_argv(&[]),
            Err(CommandError::EmptyArgv)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_and_feeds_stdin() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("cat", Vec::<String>::new());

        let output = capture(&spec, temp.path(), Some(b"hello".as_slice())).await.unwrap();

        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout_text(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_reports_failed_status() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("sh", ["-c", "echo nope >&2; exit 3"]);

        let err = run(&spec, temp.path(), None).await.unwrap_err();

        match err {
            CommandError::Failed { status, stderr, .. } => {
                assert_eq!(status, "3");
                assert_eq!(stderr, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let temp = tempdir().unwrap();
        let spec = CommandSpec::new("docsync-no-such-program", ["--version"]);

        let err = capture(&spec, temp.path(), None).await.unwrap_err();

        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
