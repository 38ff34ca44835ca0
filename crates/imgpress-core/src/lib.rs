//! imgpress core - Embeddable batch image compression pipeline.
//!
//! Discovers image files, runs each through a per-format sequence of
//! compression tools against a scratch copy, and reports the results
//! without ever touching the original file. Persisting the processed bytes
//! is the caller's job inside the [`BatchObserver`] hooks.
//!
//! # Architecture
//!
//! ```text
//! Discover → Build workflow → Stage scratch copy → Run steps → Complete
//! ```
//!
//! Pipelines for different files run concurrently and converge only on the
//! batch completion counter. Within one file, steps are strictly
//! sequential, and no step failure ever aborts the file or the batch.
//!
//! # Usage
//!
//! ```rust,ignore
//! use imgpress_core::{BatchOptions, Config, InputSource, Optimizer};
//!
//! #[tokio::main]
//! async fn main() -> imgpress_core::Result<()> {
//!     let config = Config::load()?;
//!     let options = BatchOptions::new(
//!         InputSource::DirectoryTree("./images".into()),
//!         &config,
//!     );
//!     let optimizer = Optimizer::new(config, options);
//!     optimizer.run(my_observer).await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod batch;
pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod runner;
pub mod types;
pub mod workflow;

// Re-exports for convenient access
pub use batch::{BatchObserver, Optimizer};
pub use catalog::Catalog;
pub use config::{BatchOptions, Config, InputSource, SizeSpec, ToolsConfig};
pub use error::{BatchError, ConfigError, ImgpressError, Result};
pub use output::resolve_output_path;
pub use runner::{ProcessInvoker, StepOutcome, StepRunner, ToolInvoker};
pub use types::FileInfo;
pub use workflow::{build_workflow, Step, ToolStep, Workflow};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
