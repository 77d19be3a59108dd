//! Subprocess-based backend for external renderers
//!
//! The workload is staged as an HTML file next to the artifact, then the
//! renderer is spawned with `{input}` and `{output}` placeholders in its
//! argument list replaced by the staged file and the artifact path.

use crate::adapter::RenderBackend;
use crate::workload::Workload;
use crate::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";
const UNKNOWN_VERSION: &str = "unknown";
const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Backend that renders by running an external command
pub struct SubprocessAdapter {
    name: String,
    command: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    extension: String,
    version: Mutex<Option<String>>,
}

impl SubprocessAdapter {
    /// Create a new subprocess adapter
    ///
    /// # Arguments
    /// * `name` - Backend name (e.g., "wkhtmltopdf")
    /// * `command` - Executable name or path
    /// * `args` - Arguments; `{input}` and `{output}` are substituted per render
    /// * `env` - Extra environment variables
    pub fn new(
        name: impl Into<String>,
        command: impl Into<PathBuf>,
        args: Vec<String>,
        env: Vec<(String, String)>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            env,
            extension: "pdf".to_string(),
            version: Mutex::new(None),
        }
    }

    /// Override the artifact extension (default `pdf`)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// First non-empty line printed by `<command> --version`
    async fn query_version(&self) -> Option<String> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(VERSION_QUERY_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => output,
            Ok(Ok(output)) => {
                tracing::debug!(backend = %self.name, "--version exited with {:?}", output.status.code());
                return None;
            }
            Ok(Err(e)) => {
                tracing::debug!(backend = %self.name, "--version failed: {}", e);
                return None;
            }
            Err(_) => {
                tracing::debug!(backend = %self.name, "--version timed out");
                return None;
            }
        };

        first_line(&output.stdout).or_else(|| first_line(&output.stderr))
    }

    /// Path the workload is staged at for a given artifact
    fn staging_path(destination: &Path) -> PathBuf {
        destination.with_extension("source.html")
    }

    fn expand_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();

        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, input.as_ref())
                    .replace(OUTPUT_PLACEHOLDER, output.as_ref())
            })
            .collect()
    }

    /// Execute the renderer subprocess
    async fn execute_subprocess(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.command);
        cmd.args(self.expand_args(input, output));

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // The runner aborts timed-out renders; dropping the child must end it too.
        cmd.kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| Error::render(&self.name, format!("Failed to spawn subprocess: {}", e)))?;

        let result = child
            .wait_with_output()
            .await
            .map_err(|e| Error::render(&self.name, format!("Failed to wait for subprocess: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::render(
                &self.name,
                format!(
                    "Subprocess failed with exit code {:?}\nstderr: {}",
                    result.status.code(),
                    stderr.trim()
                ),
            ));
        }

        Ok(())
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl RenderBackend for SubprocessAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    /// Version reported by the renderer, known once [`setup`](RenderBackend::setup) succeeded
    fn version(&self) -> String {
        self.version
            .lock()
            .clone()
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    async fn render(&self, workload: &Workload, destination: &Path) -> Result<()> {
        let input = Self::staging_path(destination);
        tokio::fs::write(&input, workload.markup()).await?;

        self.execute_subprocess(&input, destination).await?;

        if !tokio::fs::try_exists(destination).await.unwrap_or(false) {
            return Err(Error::render(
                &self.name,
                format!("renderer exited successfully but wrote no {}", destination.display()),
            ));
        }

        Ok(())
    }

    async fn setup(&self) -> Result<()> {
        which::which(&self.command).map_err(|e| Error::Setup {
            backend: self.name.clone(),
            message: format!("Command '{}' not found: {}", self.command.display(), e),
        })?;

        if self.version.lock().is_none() {
            let version = self.query_version().await;
            *self.version.lock() = version;
        }

        Ok(())
    }
}
