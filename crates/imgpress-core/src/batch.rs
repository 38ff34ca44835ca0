//! Batch orchestration and completion aggregation.
//!
//! One tokio task per discovered file; pipelines run independently and
//! converge only on the shared completion counter. The batch-complete
//! notification fires exactly once, after every per-file notification.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::catalog::Catalog;
use crate::config::{BatchOptions, Config, InputSource, ToolsConfig};
use crate::error::{BatchError, Result};
use crate::output::resolve_output_path;
use crate::pipeline::{run_pipeline, stage_scratch};
use crate::runner::{StepRunner, ToolInvoker};
use crate::types::FileInfo;
use crate::workflow::build_workflow;

/// Collaborator notified as files and the whole batch finish.
///
/// `on_file_processed` receives the processed copy (content loaded, path
/// already resolved to the final output location) and the re-read
/// original; persisting either is the implementor's responsibility.
pub trait BatchObserver: Send + Sync {
    fn on_file_processed(&self, processed: &FileInfo, original: &FileInfo);
    fn on_complete(&self, count: usize);
}

/// Shared completion state for one batch.
struct BatchContext {
    completed: AtomicUsize,
    total: usize,
}

impl BatchContext {
    fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Record one finished file; fires the batch callback on the last one.
    ///
    /// The increment-and-compare is a single atomic fetch_add, so exactly
    /// one caller observes the final count.
    fn finish_one(&self, observer: &dyn BatchObserver) {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if done == self.total {
            observer.on_complete(done);
        }
    }
}

/// The main entry point: discovers files and runs their pipelines.
pub struct Optimizer {
    config: Config,
    options: BatchOptions,
    runner: Arc<StepRunner>,
}

impl Optimizer {
    /// Create an optimizer that invokes the real external tools.
    pub fn new(config: Config, options: BatchOptions) -> Self {
        let runner = Arc::new(StepRunner::new(config.tools.step_timeout_secs));
        Self {
            config,
            options,
            runner,
        }
    }

    /// Create an optimizer with a custom tool invoker (used by tests).
    pub fn with_invoker(
        config: Config,
        options: BatchOptions,
        invoker: Box<dyn ToolInvoker>,
    ) -> Self {
        let runner = Arc::new(StepRunner::with_invoker(
            invoker,
            config.tools.step_timeout_secs,
        ));
        Self {
            config,
            options,
            runner,
        }
    }

    /// Run the whole batch to completion.
    ///
    /// Returns the number of files processed. The observer's per-file hook
    /// fires once per file in no particular order; its batch hook fires
    /// exactly once, last.
    pub async fn run(&self, observer: Arc<dyn BatchObserver>) -> Result<usize> {
        let catalog = Catalog::new(&self.options.match_rules);
        let files = catalog.discover(&self.options.input);
        let total = files.len();
        tracing::info!("Found {} file(s) to process", total);

        let output = self.options.resolved_output();
        if let Some(dir) = &output {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|source| BatchError::OutputDir {
                    path: dir.clone(),
                    source,
                })?;
            }
        }

        if total == 0 {
            observer.on_complete(0);
            return Ok(0);
        }

        let ctx = Arc::new(BatchContext::new(total));
        let options = Arc::new(self.options.clone());
        let tools = Arc::new(self.config.tools.clone());
        let output = Arc::new(output);

        let mut tasks = JoinSet::new();
        for record in files {
            let ctx = Arc::clone(&ctx);
            let options = Arc::clone(&options);
            let tools = Arc::clone(&tools);
            let output = Arc::clone(&output);
            let runner = Arc::clone(&self.runner);
            let observer = Arc::clone(&observer);

            tasks.spawn(async move {
                process_file(record, &options, &tools, &runner, output.as_deref(), &observer).await;
                ctx.finish_one(observer.as_ref());
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                // A panicked pipeline already lost its finish_one call;
                // surface it instead of hanging the caller on a count
                // that can never be reached
                return Err(BatchError::TaskJoin(e.to_string()).into());
            }
        }

        Ok(total)
    }
}

/// Run one file's pipeline: stage, execute steps, complete.
async fn process_file(
    record: FileInfo,
    options: &BatchOptions,
    tools: &ToolsConfig,
    runner: &StepRunner,
    output: Option<&Path>,
    observer: &Arc<dyn BatchObserver>,
) {
    let scratch = match stage_scratch(&record).await {
        Ok(scratch) => scratch,
        Err(e) => {
            tracing::warn!("Failed to stage {}: {}", record.path.display(), e);
            return;
        }
    };

    let workflow = build_workflow(&record, options, tools, &scratch);
    run_pipeline(&record, &workflow, runner, &scratch).await;

    if let Err(e) = complete_file(record, &scratch, &options.input, output, observer).await {
        tracing::warn!("Completion failed: {}", e);
    }

    if let Err(e) = tokio::fs::remove_file(&scratch).await {
        tracing::warn!("Failed to remove scratch {}: {}", scratch.display(), e);
    }
}

/// Completion stage: load both copies and notify the observer.
///
/// The original's size and bytes are re-read here, not taken from
/// discovery time; the processed record's metadata (size, MIME) is
/// recomputed from the scratch content before its path is swapped for the
/// resolved output location.
async fn complete_file(
    mut original: FileInfo,
    scratch: &Path,
    input: &InputSource,
    output: Option<&Path>,
    observer: &Arc<dyn BatchObserver>,
) -> std::io::Result<()> {
    original.content = tokio::fs::read(&original.path).await?;
    original.size = original.content.len() as u64;

    let mut processed = FileInfo::from_path(scratch)?;
    processed.content = tokio::fs::read(scratch).await?;
    processed.path = resolve_output_path(input, output, &original);

    observer.on_file_processed(&processed, &original);
    Ok(())
}
