//! Core data types for the imgpress pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata for one discovered image file.
///
/// Created during catalog discovery; the `content` field stays empty until
/// completion time, when both the original and the processed copy are read
/// back from disk for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute path to the file
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// File extension without the dot ("png", "jpg", ...)
    pub ext: String,

    /// Base name without the extension
    pub name: String,

    /// Containing directory
    pub dir: PathBuf,

    /// Detected MIME type ("image/png", "image/jpeg", ...)
    pub mime: String,

    /// Raw file bytes, populated at completion time
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl FileInfo {
    /// Read metadata for a file on disk.
    ///
    /// The MIME type is sniffed from the content signature; if sniffing is
    /// inconclusive the extension-derived `image/<ext>` is used instead.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let dir = path.parent().unwrap_or(Path::new("")).to_path_buf();

        let mime = detect_mime(path, &ext);

        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            ext,
            name,
            dir,
            mime,
            content: Vec::new(),
        })
    }
}

/// Sniff a file's MIME type from its content signature.
///
/// Falls back to `image/<ext>` when the file cannot be read or the
/// signature is not a known image format.
pub fn detect_mime(path: &Path, ext: &str) -> String {
    let fallback = format!("image/{}", ext.to_lowercase());

    let Ok(bytes) = std::fs::read(path) else {
        return fallback;
    };
    match image::guess_format(&bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => fallback,
    }
}
