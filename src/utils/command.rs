//! Building and running dump commands with timeouts

use super::executor::DumpError;
use super::runtime;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How an option's value is attached to its flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgStyle {
    /// `--name=value`
    Equals,
    /// `--name value`
    Separate,
}

/// A dump tool invocation: program name, arguments and extra environment
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DumpCommand {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    sensitive: Vec<String>,
}

impl DumpCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Append a raw argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `--name` without a value
    pub fn flag(self, name: &str) -> Self {
        self.arg(format!("--{}", name))
    }

    /// Append `--name` with a value in the given style
    pub fn option(self, name: &str, value: impl Into<String>, style: ArgStyle) -> Self {
        let value = value.into();
        match style {
            ArgStyle::Equals => self.arg(format!("--{}={}", name, value)),
            ArgStyle::Separate => self.arg(format!("--{}", name)).arg(value),
        }
    }

    /// Append an option whose value must never be logged
    pub fn secret_option(mut self, name: &str, value: impl Into<String>, style: ArgStyle) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.sensitive.push(value.clone());
        }
        self.option(name, value, style)
    }

    /// Set an environment variable whose value must never be logged
    pub fn secret_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.sensitive.push(value.clone());
        }
        self.env.push((key.into(), value));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn envs(&self) -> &[(String, String)] {
        &self.env
    }

    /// Argument line with secrets masked, safe to log
    pub fn redacted_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| self.redact(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn redact(&self, text: &str) -> String {
        self.sensitive
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), "***"))
    }
}

impl std::fmt::Debug for DumpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_keys: Vec<&str> = self.env.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("DumpCommand")
            .field("program", &self.program)
            .field("args", &self.redacted_args())
            .field("env", &env_keys)
            .finish()
    }
}

/// Exit status and captured streams of a finished command
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Run a command with a hard timeout
///
/// With `stdout_file` set, standard output is written into that file
/// (created or truncated); otherwise it is captured in memory. The child is
/// killed when the timeout expires.
pub fn run_command(
    binary: &Path,
    command: &DumpCommand,
    stdout_file: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput, DumpError> {
    let mut cmd = tokio::process::Command::new(binary);
    cmd.args(command.args());
    for (key, value) in command.envs() {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    match stdout_file {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|source| DumpError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            cmd.stdout(Stdio::from(file));
        }
        None => {
            cmd.stdout(Stdio::piped());
        }
    }

    debug!(
        "Running command: {} {}",
        binary.display(),
        command.redacted_args()
    );

    let program = command.program().to_string();
    let output = runtime::block_on(async move {
        let mut child = cmd.spawn().map_err(|source| DumpError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout_reader = tokio::spawn(drain(child.stdout.take()));
        let mut stderr_chunks = stream_chunks(child.stderr.take());

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(|source| DumpError::Spawn {
                    program: program.clone(),
                    source,
                })?;
                let mut stderr = Vec::new();
                collect_chunks(&mut stderr_chunks, &mut stderr).await;
                Ok(CommandOutput {
                    status,
                    stdout: stdout_reader.await.unwrap_or_default(),
                    stderr,
                })
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed out {}: {}", program, e);
                }
                // Grandchildren may keep the pipe open, so only wait briefly
                let mut stderr = Vec::new();
                let _ = tokio::time::timeout(
                    STDERR_GRACE,
                    collect_chunks(&mut stderr_chunks, &mut stderr),
                )
                .await;
                Err(DumpError::Timeout {
                    program,
                    timeout,
                    stderr: command.redact(String::from_utf8_lossy(&stderr).trim()),
                })
            }
        }
    })
    .map_err(DumpError::Runtime)??;

    let stderr = command.redact(String::from_utf8_lossy(&output.stderr).trim());

    if !output.status.success() {
        return Err(DumpError::Failed {
            program: command.program().to_string(),
            code: output.status.code(),
            stderr,
        });
    }

    if !stderr.is_empty() {
        debug!("{} stderr: {}", command.program(), stderr);
    }

    Ok(output)
}

const STDERR_GRACE: Duration = Duration::from_millis(500);

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = reader {
        if let Err(e) = reader.read_to_end(&mut buffer).await {
            debug!("Failed to read child output: {}", e);
        }
    }
    buffer
}

/// Forward a stream chunk by chunk so a partial read survives a kill
fn stream_chunks<R>(reader: Option<R>) -> mpsc::UnboundedReceiver<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(mut reader) = reader {
        tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(chunk[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("Failed to read child output: {}", e);
                        break;
                    }
                }
            }
        });
    }
    rx
}

async fn collect_chunks(chunks: &mut mpsc::UnboundedReceiver<Vec<u8>>, buffer: &mut Vec<u8>) {
    while let Some(chunk) = chunks.recv().await {
        buffer.extend_from_slice(&chunk);
    }
}
