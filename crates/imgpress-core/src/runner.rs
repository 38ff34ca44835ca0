//! Step execution with a deliberate fault-tolerance policy.
//!
//! Every step outcome advances the workflow: a failed tool invocation or
//! resize leaves the scratch file as-is and the pipeline moves on. Nothing
//! here ever touches the original file; mutation is confined to the scratch
//! copy.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Command;

use crate::workflow::{Step, ToolStep};

/// Result of running one step. Never aborts the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran to completion
    Completed,

    /// The step failed or was skipped; the scratch file is unchanged by it
    Skipped(String),
}

/// Seam for spawning external tools, so tests can substitute fakes.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Run the program with the given arguments and wait for it to exit.
    async fn invoke(&self, program: &Path, args: &[String]) -> std::io::Result<ExitStatus>;
}

/// Default invoker: spawns a real child process.
pub struct ProcessInvoker;

#[async_trait]
impl ToolInvoker for ProcessInvoker {
    async fn invoke(&self, program: &Path, args: &[String]) -> std::io::Result<ExitStatus> {
        let output = Command::new(program).args(args).output().await?;
        if !output.status.success() {
            tracing::debug!(
                "{} stderr: {}",
                program.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(output.status)
    }
}

/// Runs the steps of a workflow against a scratch copy.
pub struct StepRunner {
    invoker: Box<dyn ToolInvoker>,
    step_timeout: Option<Duration>,
}

impl StepRunner {
    /// Create a runner that spawns real processes.
    pub fn new(step_timeout_secs: u64) -> Self {
        Self::with_invoker(Box::new(ProcessInvoker), step_timeout_secs)
    }

    /// Create a runner with a custom tool invoker.
    pub fn with_invoker(invoker: Box<dyn ToolInvoker>, step_timeout_secs: u64) -> Self {
        let step_timeout = match step_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            invoker,
            step_timeout,
        }
    }

    /// Run one step against the scratch file.
    ///
    /// `original` is the untouched source file; the resize step probes its
    /// dimensions there while writing only to `scratch`.
    pub async fn run(&self, step: &Step, original: &Path, scratch: &Path) -> StepOutcome {
        match step {
            Step::Tool(tool) => self.run_tool(tool).await,
            Step::Resize { width, height } => {
                run_resize(original, scratch, *width, *height).await
            }
        }
    }

    async fn run_tool(&self, tool: &ToolStep) -> StepOutcome {
        tracing::debug!("Running {} {}", tool.name, tool.args.join(" "));

        let invocation = self.invoker.invoke(&tool.program, &tool.args);
        let result = match self.step_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, invocation).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("{} timed out after {:?}", tool.name, timeout);
                    return StepOutcome::Skipped(format!("{} timed out", tool.name));
                }
            },
            None => invocation.await,
        };

        match result {
            Ok(status) if status.success() => StepOutcome::Completed,
            Ok(status) => {
                tracing::warn!("{} exited with {}", tool.name, status);
                StepOutcome::Skipped(format!("{} exited with {}", tool.name, status))
            }
            Err(e) => {
                tracing::warn!("Failed to spawn {}: {}", tool.name, e);
                StepOutcome::Skipped(format!("failed to spawn {}: {}", tool.name, e))
            }
        }
    }
}

/// In-process resize of the scratch file.
///
/// Dimensions are probed from the original path; a probe failure or an
/// upscale request skips the step. The resize fits within the requested
/// box, preserving aspect ratio, and overwrites the scratch file in place.
async fn run_resize(
    original: &Path,
    scratch: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> StepOutcome {
    let original = original.to_path_buf();
    let scratch = scratch.to_path_buf();

    let result = tokio::task::spawn_blocking(move || {
        resize_blocking(&original, &scratch, width, height)
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Resize task failed: {}", e);
            StepOutcome::Skipped(format!("resize task failed: {}", e))
        }
    }
}

fn resize_blocking(
    original: &Path,
    scratch: &Path,
    width: Option<u32>,
    height: Option<u32>,
) -> StepOutcome {
    let (src_w, src_h) = match image::image_dimensions(original) {
        Ok(dims) => dims,
        Err(e) => {
            tracing::warn!(
                "Cannot probe dimensions of {}: {}",
                original.display(),
                e
            );
            return StepOutcome::Skipped("dimension probe failed".to_string());
        }
    };

    // Never upscale
    if width.is_some_and(|w| w > src_w) || height.is_some_and(|h| h > src_h) {
        tracing::debug!(
            "Skipping resize of {}: requested size exceeds {}x{}",
            original.display(),
            src_w,
            src_h
        );
        return StepOutcome::Skipped("requested size exceeds source".to_string());
    }

    let img = match image::open(scratch) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!("Cannot open {} for resize: {}", scratch.display(), e);
            return StepOutcome::Skipped("scratch file unreadable".to_string());
        }
    };

    let resized = img.resize(
        width.unwrap_or(u32::MAX),
        height.unwrap_or(u32::MAX),
        image::imageops::FilterType::Lanczos3,
    );

    match resized.save(scratch) {
        Ok(()) => StepOutcome::Completed,
        Err(e) => {
            tracing::warn!("Failed to write resized {}: {}", scratch.display(), e);
            StepOutcome::Skipped(format!("resize write failed: {}", e))
        }
    }
}
