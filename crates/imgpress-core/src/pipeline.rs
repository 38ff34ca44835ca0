//! Per-file pipeline: scratch staging and sequential step execution.
//!
//! Each file gets a scratch copy before any step runs; every step mutates
//! the scratch copy only, and step i+1 never starts before step i's outcome
//! is observed. No step outcome aborts the pipeline.

use std::path::{Path, PathBuf};

use crate::runner::{StepOutcome, StepRunner};
use crate::types::FileInfo;
use crate::workflow::{Step, Workflow};

/// Copy the original file to a freshly allocated scratch path.
///
/// The scratch path keeps the original's extension (tools and the resize
/// writer pick their format from it) but is otherwise unique per
/// invocation, so concurrent pipelines can never collide.
pub async fn stage_scratch(record: &FileInfo) -> std::io::Result<PathBuf> {
    let suffix = if record.ext.is_empty() {
        String::new()
    } else {
        format!(".{}", record.ext)
    };

    let scratch = tempfile::Builder::new()
        .prefix("imgpress-")
        .suffix(&suffix)
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|e| e.error)?;

    tokio::fs::copy(&record.path, &scratch).await?;
    Ok(scratch)
}

/// Run a workflow's steps strictly in order against the scratch copy.
///
/// Returns the per-step outcomes; failures are already swallowed by the
/// runner, so the returned list always has one entry per step.
pub async fn run_pipeline(
    record: &FileInfo,
    workflow: &Workflow,
    runner: &StepRunner,
    scratch: &Path,
) -> Vec<StepOutcome> {
    let mut outcomes = Vec::with_capacity(workflow.len());

    for step in workflow {
        let name = step_name(step);
        let start = std::time::Instant::now();
        let outcome = runner.run(step, &record.path, scratch).await;
        tracing::trace!(
            "{}: {} finished in {:?} ({:?})",
            record.path.display(),
            name,
            start.elapsed(),
            outcome
        );
        outcomes.push(outcome);
    }

    outcomes
}

fn step_name(step: &Step) -> &'static str {
    match step {
        Step::Tool(tool) => tool.name,
        Step::Resize { .. } => "resize",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ToolInvoker;
    use crate::workflow::ToolStep;
    use async_trait::async_trait;
    use std::process::ExitStatus;
    use std::sync::{Arc, Mutex};

    fn write_png(path: &Path) {
        image::DynamicImage::new_rgb8(4, 4)
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    #[tokio::test]
    async fn scratch_is_a_distinct_path_with_same_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        write_png(&path);
        let record = FileInfo::from_path(&path).unwrap();

        let scratch = stage_scratch(&record).await.unwrap();
        assert_ne!(scratch, record.path);
        assert_eq!(scratch.extension().unwrap(), "png");
        assert_eq!(
            std::fs::read(&scratch).unwrap(),
            std::fs::read(&record.path).unwrap()
        );
        std::fs::remove_file(scratch).unwrap();
    }

    #[tokio::test]
    async fn scratch_paths_are_unique_per_staging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        write_png(&path);
        let record = FileInfo::from_path(&path).unwrap();

        let a = stage_scratch(&record).await.unwrap();
        let b = stage_scratch(&record).await.unwrap();
        assert_ne!(a, b);
        std::fs::remove_file(a).unwrap();
        std::fs::remove_file(b).unwrap();
    }

    /// Invoker that logs each tool name, in call order.
    struct OrderingInvoker {
        order: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ToolInvoker for OrderingInvoker {
        async fn invoke(&self, program: &Path, _args: &[String]) -> std::io::Result<ExitStatus> {
            self.order
                .lock()
                .unwrap()
                .push(program.to_string_lossy().into_owned());
            std::process::Command::new("true").status()
        }
    }

    #[tokio::test]
    async fn steps_run_strictly_in_workflow_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        write_png(&path);
        let record = FileInfo::from_path(&path).unwrap();
        let scratch = stage_scratch(&record).await.unwrap();

        let order = Arc::new(Mutex::new(Vec::new()));
        let invoker = Box::new(OrderingInvoker {
            order: Arc::clone(&order),
        });

        let workflow: Workflow = vec![
            Step::Tool(ToolStep {
                name: "first",
                program: PathBuf::from("first"),
                args: vec![],
            }),
            Step::Tool(ToolStep {
                name: "second",
                program: PathBuf::from("second"),
                args: vec![],
            }),
            Step::Tool(ToolStep {
                name: "third",
                program: PathBuf::from("third"),
                args: vec![],
            }),
        ];

        let runner = StepRunner::with_invoker(invoker, 0);
        let outcomes = run_pipeline(&record, &workflow, &runner, &scratch).await;

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| *o == StepOutcome::Completed));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
        std::fs::remove_file(scratch).unwrap();
    }

    #[tokio::test]
    async fn failed_step_does_not_stop_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        write_png(&path);
        let record = FileInfo::from_path(&path).unwrap();
        let scratch = stage_scratch(&record).await.unwrap();

        // Real invoker, nonexistent binaries: both steps fail, both advance
        let runner = StepRunner::new(0);
        let workflow: Workflow = vec![
            Step::Tool(ToolStep {
                name: "ghost-a",
                program: PathBuf::from("/nonexistent/ghost-a"),
                args: vec![],
            }),
            Step::Tool(ToolStep {
                name: "ghost-b",
                program: PathBuf::from("/nonexistent/ghost-b"),
                args: vec![],
            }),
        ];
        let outcomes = run_pipeline(&record, &workflow, &runner, &scratch).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, StepOutcome::Skipped(_))));
        // Scratch still holds the staged copy
        assert_eq!(
            std::fs::read(&scratch).unwrap(),
            std::fs::read(&record.path).unwrap()
        );
        std::fs::remove_file(scratch).unwrap();
    }
}
