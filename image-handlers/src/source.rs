//! Source resolution: pick the image behind a `/floppify` reply, download it and stage it in a temp file.

use std::path::{Path, PathBuf};

use floppy_core::{Bot, DocumentRef, PhotoRef, ReplyTarget, TriggerContent};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{JobError, RejectReason};

/// Filename extensions accepted for documents regardless of their declared media type.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".webp", ".gif"];
const DEFAULT_EXTENSION: &str = ".jpg";

/// The remote file chosen as the edit source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub file_id: String,
    pub kind: &'static str,
}

/// True when the document declares an `image/*` type or carries a known image extension.
pub fn is_image_document(doc: &DocumentRef) -> bool {
    let image_mime = doc
        .mime_type
        .as_deref()
        .map(|m| m.starts_with("image/"))
        .unwrap_or(false);
    let image_name = doc
        .file_name
        .as_deref()
        .map(|name| {
            let lower = name.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        })
        .unwrap_or(false);
    image_mime || image_name
}

fn largest_photo(sizes: &[PhotoRef]) -> Option<&PhotoRef> {
    // max_by_key keeps the last of equal elements, matching the transport's ascending order.
    sizes.iter().max_by_key(|p| p.pixels())
}

/// Chooses the file to edit from the replied-to message.
pub fn select_source(reply: Option<&ReplyTarget>) -> Result<SourceRef, RejectReason> {
    let target = reply.ok_or(RejectReason::NoReply)?;
    match &target.content {
        TriggerContent::Photo(sizes) => largest_photo(sizes)
            .map(|p| SourceRef {
                file_id: p.file_id.clone(),
                kind: "photo",
            })
            .ok_or(RejectReason::NoImageContent),
        TriggerContent::Document(doc) if is_image_document(doc) => Ok(SourceRef {
            file_id: doc.file_id.clone(),
            kind: "document",
        }),
        TriggerContent::Document(_) => Err(RejectReason::NotAnImage),
        TriggerContent::None => Err(RejectReason::NoImageContent),
    }
}

/// Extension of the remote file path including the dot, `.jpg` when there is none.
pub fn extension_from_path(remote_path: &str) -> String {
    Path::new(remote_path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Source image persisted for the lifetime of one job. The file is deleted by [`StagedSource::release`]
/// or, failing that, when this value is dropped.
#[derive(Debug)]
pub struct StagedSource {
    file: NamedTempFile,
    pub extension: String,
}

impl StagedSource {
    /// Writes `bytes` to a fresh temp file whose suffix is `extension`, in `dir` or the system
    /// temp dir.
    pub async fn create(bytes: &[u8], extension: &str, dir: Option<&Path>) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("floppify-").suffix(extension);
        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tokio::fs::write(file.path(), bytes).await?;
        Ok(Self {
            file,
            extension: extension.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.file.path()).await
    }

    /// Deletes the staged file now and returns its former path.
    pub fn release(self) -> PathBuf {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!(path = %path.display(), error = %e, "Failed to remove staged source");
        }
        path
    }
}

/// Downloads `source` through the transport and stages it on disk.
pub async fn stage_source(
    bot: &dyn Bot,
    source: &SourceRef,
    staging_dir: Option<&Path>,
) -> Result<StagedSource, JobError> {
    let downloaded = bot
        .download_file(&source.file_id)
        .await
        .map_err(JobError::Download)?;
    let extension = extension_from_path(&downloaded.remote_path);
    let staged = StagedSource::create(&downloaded.bytes, &extension, staging_dir).await?;
    debug!(
        kind = source.kind,
        remote_path = %downloaded.remote_path,
        staged_path = %staged.path().display(),
        size = downloaded.bytes.len(),
        "Source staged"
    );
    Ok(staged)
}
