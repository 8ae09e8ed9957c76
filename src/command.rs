use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runs `program` and returns what it wrote, stdout first then stderr.
///
/// The child is polled until `timeout` has elapsed; after that it is killed and reaped so
/// a hung tool can't stall whoever asked for the user agent.
/// Only meant for tools printing a couple of lines: output is read once the process exited.
pub(crate) fn run_with_timeout(
    program: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<Vec<u8>, CommandError> {
    let error = |kind| CommandError::new(program, kind);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| error(CommandErrorKind::Io(e)))?;

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                // Either call can fail if the child exited in between, nothing to do about it
                let _ = child.kill();
                let _ = child.wait();
                return Err(error(CommandErrorKind::Timeout(timeout)));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(error(CommandErrorKind::Io(e)));
            }
        }
    };

    if !status.success() {
        return Err(error(CommandErrorKind::Failed(status)));
    }

    let mut output = Vec::new();
    if let Some(mut stdout) = child.stdout.take() {
        stdout
            .read_to_end(&mut output)
            .map_err(|e| error(CommandErrorKind::Io(e)))?;
    }
    if let Some(mut stderr) = child.stderr.take() {
        stderr
            .read_to_end(&mut output)
            .map_err(|e| error(CommandErrorKind::Io(e)))?;
    }

    Ok(output)
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to run `{program}`: {source}")]
#[non_exhaustive]
pub struct CommandError {
    pub program: String,
    pub source: CommandErrorKind,
}

impl CommandError {
    pub fn new(program: impl AsRef<Path>, source: CommandErrorKind) -> Self {
        Self {
            program: program.as_ref().display().to_string(),
            source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandErrorKind {
    #[error("not found on the PATH")]
    NotFound,
    #[error(transparent)]
    Io(std::io::Error),
    #[error("no answer after {0:?}")]
    Timeout(Duration),
    #[error("exited with {0}")]
    Failed(ExitStatus),
    #[error("unexpected output: {0:?}")]
    UnexpectedOutput(String),
    #[error("invalid JSON output: {0}")]
    Json(serde_json::Error),
}
