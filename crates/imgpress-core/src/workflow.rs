//! Workflow construction: the ordered step list for one file.
//!
//! Dispatches on the detected MIME type. Every argument list is fully
//! resolved here, against the file's scratch path, before anything runs.

use std::path::{Path, PathBuf};

use crate::config::{BatchOptions, SizeSpec, ToolsConfig};
use crate::types::FileInfo;

/// One unit of work in a file's workflow.
#[derive(Debug, Clone)]
pub enum Step {
    /// Invoke an external compression tool
    Tool(ToolStep),

    /// In-process resize of the scratch copy
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// A fully-resolved external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolStep {
    /// Short tool name for logging ("optipng", "pngquant", ...)
    pub name: &'static str,

    /// Executable reference, resolved through PATH if relative
    pub program: PathBuf,

    /// Ordered argument list, scratch path already substituted
    pub args: Vec<String>,
}

/// Ordered, immutable step sequence for one file.
pub type Workflow = Vec<Step>;

/// Default lossy strength when a tool always runs in lossy mode.
const DEFAULT_LOSSY: u8 = 20;

/// Build the workflow for a file, targeting its scratch copy.
///
/// Unhandled MIME types get no format step (the file still flows through
/// completion as an unchanged copy); a resize step is appended whenever the
/// caller asked for one, regardless of format dispatch.
pub fn build_workflow(
    record: &FileInfo,
    options: &BatchOptions,
    tools: &ToolsConfig,
    scratch: &Path,
) -> Workflow {
    let mut workflow = Workflow::new();

    // Strength 0 disables the lossy steps outright
    let lossy = options.lossy.filter(|&l| l > 0);

    match record.mime.as_str() {
        "image/png" => {
            workflow.push(optipng(tools, scratch));
            if let Some(lossy) = lossy {
                workflow.push(pngquant(tools, scratch, lossy));
            }
        }
        // The JPEG path is always lossy: jpegoptim runs with the default
        // strength even when the caller never asked for lossy output.
        "image/jpg" | "image/jpeg" => {
            workflow.push(jpegoptim(tools, scratch, lossy));
        }
        "image/gif" => {
            workflow.push(gifsicle(tools, scratch, lossy));
        }
        other => {
            tracing::warn!(
                "No compression tool handles {} ({})",
                record.path.display(),
                other
            );
        }
    }

    if let Some(SizeSpec { width, height }) = options.size {
        workflow.push(Step::Resize { width, height });
    }

    workflow
}

/// PNG lossless recompression.
fn optipng(tools: &ToolsConfig, scratch: &Path) -> Step {
    Step::Tool(ToolStep {
        name: "optipng",
        program: tools.optipng_path.clone(),
        args: vec![
            "-strip".to_string(),
            "all".to_string(),
            "-o2".to_string(),
            "-force".to_string(),
            scratch.to_string_lossy().into_owned(),
        ],
    })
}

/// PNG lossy palette quantization.
fn pngquant(tools: &ToolsConfig, scratch: &Path, lossy: u8) -> Step {
    let quality = 100 - u32::from(lossy);
    Step::Tool(ToolStep {
        name: "pngquant",
        program: tools.pngquant_path.clone(),
        args: vec![
            format!("--quality={}", quality),
            "--speed=3".to_string(),
            "--force".to_string(),
            format!("--output={}", scratch.to_string_lossy()),
            scratch.to_string_lossy().into_owned(),
        ],
    })
}

/// JPEG optimization; `quality = 100 - strength`.
fn jpegoptim(tools: &ToolsConfig, scratch: &Path, lossy: Option<u8>) -> Step {
    let quality = 100 - u32::from(lossy.unwrap_or(DEFAULT_LOSSY));
    Step::Tool(ToolStep {
        name: "jpegoptim",
        program: tools.jpegoptim_path.clone(),
        args: vec![
            "--strip-all".to_string(),
            "--all-progressive".to_string(),
            "-m".to_string(),
            quality.to_string(),
            scratch.to_string_lossy().into_owned(),
        ],
    })
}

/// GIF optimization; quality scales into a 0-256 palette size.
fn gifsicle(tools: &ToolsConfig, scratch: &Path, lossy: Option<u8>) -> Step {
    let quality = 100 - u32::from(lossy.unwrap_or(DEFAULT_LOSSY));
    let colors = (256.0 * f64::from(quality) / 100.0).round() as u32;
    Step::Tool(ToolStep {
        name: "gifsicle",
        program: tools.gifsicle_path.clone(),
        args: vec![
            "-O=3".to_string(),
            "--colors".to_string(),
            colors.to_string(),
            "--output".to_string(),
            scratch.to_string_lossy().into_owned(),
            scratch.to_string_lossy().into_owned(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, InputSource};

    fn record(mime: &str) -> FileInfo {
        FileInfo {
            path: PathBuf::from("/photos/pic.png"),
            size: 1000,
            ext: "png".to_string(),
            name: "pic".to_string(),
            dir: PathBuf::from("/photos"),
            mime: mime.to_string(),
            content: Vec::new(),
        }
    }

    fn options() -> BatchOptions {
        BatchOptions::new(InputSource::FileList(vec![]), &Config::default())
    }

    fn tool_names(workflow: &Workflow) -> Vec<&'static str> {
        workflow
            .iter()
            .filter_map(|step| match step {
                Step::Tool(t) => Some(t.name),
                Step::Resize { .. } => None,
            })
            .collect()
    }

    #[test]
    fn png_without_lossy_is_lossless_only() {
        let workflow = build_workflow(
            &record("image/png"),
            &options(),
            &ToolsConfig::default(),
            Path::new("/tmp/s.png"),
        );
        assert_eq!(tool_names(&workflow), vec!["optipng"]);
    }

    #[test]
    fn png_with_lossy_appends_pngquant() {
        let opts = options().with_lossy(30).unwrap();
        let workflow = build_workflow(
            &record("image/png"),
            &opts,
            &ToolsConfig::default(),
            Path::new("/tmp/s.png"),
        );
        assert_eq!(tool_names(&workflow), vec!["optipng", "pngquant"]);

        let Step::Tool(quant) = &workflow[1] else {
            panic!("expected tool step");
        };
        assert!(quant.args.contains(&"--quality=70".to_string()));
    }

    #[test]
    fn lossy_zero_behaves_like_lossy_absent() {
        let mut opts = options();
        opts.lossy = Some(0);

        let workflow = build_workflow(
            &record("image/png"),
            &opts,
            &ToolsConfig::default(),
            Path::new("/tmp/s.png"),
        );
        assert_eq!(tool_names(&workflow), vec!["optipng"]);

        let workflow = build_workflow(
            &record("image/jpeg"),
            &opts,
            &ToolsConfig::default(),
            Path::new("/tmp/s.jpg"),
        );
        let Step::Tool(step) = &workflow[0] else {
            panic!("expected tool step");
        };
        // falls back to the default strength, quality 80
        assert!(step.args.contains(&"80".to_string()));
    }

    #[test]
    fn jpeg_always_runs_jpegoptim_with_default_strength() {
        let workflow = build_workflow(
            &record("image/jpeg"),
            &options(),
            &ToolsConfig::default(),
            Path::new("/tmp/s.jpg"),
        );
        assert_eq!(tool_names(&workflow), vec!["jpegoptim"]);

        let Step::Tool(step) = &workflow[0] else {
            panic!("expected tool step");
        };
        // default strength 20 inverts to quality 80
        assert!(step.args.contains(&"80".to_string()));
    }

    #[test]
    fn gif_palette_scales_with_quality() {
        let opts = options().with_lossy(50).unwrap();
        let workflow = build_workflow(
            &record("image/gif"),
            &opts,
            &ToolsConfig::default(),
            Path::new("/tmp/s.gif"),
        );
        let Step::Tool(step) = &workflow[0] else {
            panic!("expected tool step");
        };
        assert_eq!(step.name, "gifsicle");
        // 256 * 50 / 100 = 128
        assert!(step.args.contains(&"128".to_string()));
    }

    #[test]
    fn gif_default_strength_rounds_palette() {
        let workflow = build_workflow(
            &record("image/gif"),
            &options(),
            &ToolsConfig::default(),
            Path::new("/tmp/s.gif"),
        );
        let Step::Tool(step) = &workflow[0] else {
            panic!("expected tool step");
        };
        // 256 * 80 / 100 = 204.8, rounds to 205
        assert!(step.args.contains(&"205".to_string()));
    }

    #[test]
    fn unknown_mime_yields_no_format_step() {
        let workflow = build_workflow(
            &record("image/webp"),
            &options(),
            &ToolsConfig::default(),
            Path::new("/tmp/s.webp"),
        );
        assert!(workflow.is_empty());
    }

    #[test]
    fn resize_step_appended_regardless_of_mime() {
        let mut opts = options();
        opts.size = Some(SizeSpec {
            width: Some(640),
            height: None,
        });
        let workflow = build_workflow(
            &record("image/webp"),
            &opts,
            &ToolsConfig::default(),
            Path::new("/tmp/s.webp"),
        );
        assert_eq!(workflow.len(), 1);
        assert!(matches!(
            workflow[0],
            Step::Resize {
                width: Some(640),
                height: None
            }
        ));
    }

    #[test]
    fn tool_args_target_scratch_path() {
        let workflow = build_workflow(
            &record("image/png"),
            &options(),
            &ToolsConfig::default(),
            Path::new("/tmp/scratch-xyz.png"),
        );
        let Step::Tool(step) = &workflow[0] else {
            panic!("expected tool step");
        };
        assert_eq!(step.args.last().unwrap(), "/tmp/scratch-xyz.png");
    }
}
