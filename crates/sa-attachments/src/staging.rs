//! Staging area for uploads not yet owned by a record

use std::path::{Path, PathBuf};

use sa_core::config::UploadLimits;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::AttachmentResult;
use crate::layout::document_filename;
use crate::model::PhotoSlot;
use crate::validator::{UploadKind, UploadRejection};

/// An upload written to the staging directory
#[derive(Debug, Clone)]
pub struct StagedFile {
    /// Multipart field the file arrived in
    pub field: String,
    pub kind: UploadKind,
    pub original_name: String,
    pub content_type: String,
    /// Absolute path inside the staging directory
    pub path: PathBuf,
    pub size: u64,
}

/// Directory receiving upload streams
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open a new staging file
    pub async fn begin(
        &self,
        field: impl Into<String>,
        kind: UploadKind,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        max_size: u64,
    ) -> AttachmentResult<StagingWriter> {
        fs::create_dir_all(&self.dir).await?;

        let original_name = original_name.into();
        let path = self.dir.join(document_filename(&original_name));
        let file = fs::File::create(&path).await?;

        debug!(path = ?path, "Staging upload");

        Ok(StagingWriter {
            file,
            max_size,
            staged: StagedFile {
                field: field.into(),
                kind,
                original_name,
                content_type: content_type.into(),
                path,
                size: 0,
            },
        })
    }

    /// Stage an in-memory payload
    pub async fn stage_bytes(
        &self,
        field: impl Into<String>,
        kind: UploadKind,
        original_name: impl Into<String>,
        content_type: impl Into<String>,
        max_size: u64,
        data: &[u8],
    ) -> AttachmentResult<StagedFile> {
        let mut writer = self
            .begin(field, kind, original_name, content_type, max_size)
            .await?;
        if let Err(e) = writer.write_chunk(data).await {
            writer.abort().await;
            return Err(e);
        }
        writer.finish().await
    }
}

/// Streams one upload into staging while enforcing its size cap
pub struct StagingWriter {
    file: fs::File,
    max_size: u64,
    staged: StagedFile,
}

impl StagingWriter {
    pub fn path(&self) -> &Path {
        &self.staged.path
    }

    pub fn size(&self) -> u64 {
        self.staged.size
    }

    /// Append a chunk; fails once the running size exceeds the cap
    ///
    /// After an error the caller must [`abort`](Self::abort).
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> AttachmentResult<()> {
        let size = self.staged.size + chunk.len() as u64;
        if size > self.max_size {
            return Err(UploadRejection::FileTooLarge {
                size,
                max: self.max_size,
            }
            .into());
        }
        self.file.write_all(chunk).await?;
        self.staged.size = size;
        Ok(())
    }

    pub async fn finish(mut self) -> AttachmentResult<StagedFile> {
        self.file.flush().await?;
        debug!(path = ?self.staged.path, size = self.staged.size, "Upload staged");
        Ok(self.staged)
    }

    /// Drop the partial file
    pub async fn abort(self) {
        let Self { file, staged, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&staged.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = ?staged.path, error = %e, "cleanup_failure: could not remove partial upload");
            }
        }
    }
}

/// Files staged during one request, with per-request caps
#[derive(Debug, Default)]
pub struct UploadBatch {
    files: Vec<StagedFile>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the request-level caps before staging another file of `kind`
    pub fn check_admit(
        &self,
        field: &str,
        kind: UploadKind,
        limits: &UploadLimits,
    ) -> Result<(), UploadRejection> {
        if self.files.len() >= limits.max_files_per_request {
            return Err(UploadRejection::TooManyFiles {
                field: field.to_string(),
                max: limits.max_files_per_request,
            });
        }
        // photo slots are single-valued
        let max = match kind {
            UploadKind::Document => limits.max_documents_per_request,
            UploadKind::Photo(_) => 1,
        };
        if self.files.iter().filter(|f| f.kind == kind).count() >= max {
            return Err(UploadRejection::TooManyFiles {
                field: field.to_string(),
                max,
            });
        }
        Ok(())
    }

    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Absolute staging paths of every file in the batch
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Split into documents and photo uploads
    pub fn into_parts(self) -> (Vec<StagedFile>, Vec<(PhotoSlot, StagedFile)>) {
        let mut documents = Vec::new();
        let mut photos = Vec::new();
        for file in self.files {
            match file.kind {
                UploadKind::Document => documents.push(file),
                UploadKind::Photo(slot) => photos.push((slot, file)),
            }
        }
        (documents, photos)
    }
}
