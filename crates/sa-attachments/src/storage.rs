//! Jailed attachment storage
//!
//! Moves staged files into their permanent location and deletes committed
//! files. Every path is resolved against the storage root first.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sa_core::config::StorageConfig;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{AttachmentError, AttachmentResult};
use crate::layout::Layout;
use crate::paths::{lexical_normalize, PathResolver};
use crate::staging::StagingArea;

/// Local filesystem attachment store
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    resolver: PathResolver,
    layout: Layout,
    /// Absolute staging directory, never a commit target
    staging_dir: PathBuf,
}

impl AttachmentStore {
    /// Create a store rooted at `root`; `uploads_dir` and `staging_dir` are root-relative
    pub fn new(
        root: impl AsRef<Path>,
        uploads_dir: &str,
        staging_dir: &str,
    ) -> AttachmentResult<Self> {
        let resolver = PathResolver::new(root)?;
        let staging_dir = resolver.resolve(staging_dir)?;
        Ok(Self {
            resolver,
            layout: Layout::new(uploads_dir),
            staging_dir,
        })
    }

    pub fn from_config(config: &StorageConfig) -> AttachmentResult<Self> {
        Self::new(&config.root, &config.uploads_dir, &config.staging_dir)
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn staging_area(&self) -> StagingArea {
        StagingArea::new(self.staging_dir.clone())
    }

    pub fn resolve(&self, path: &str) -> AttachmentResult<PathBuf> {
        self.resolver.resolve(path)
    }

    /// Move a staged file to `dest_rel` and return the path to persist
    ///
    /// An existing file at the destination is never replaced.
    #[instrument(skip(self, staging_path), fields(dest = %dest_rel))]
    pub async fn commit(&self, staging_path: &Path, dest_rel: &str) -> AttachmentResult<String> {
        let dest = self
            .resolver
            .resolve(dest_rel)
            .map_err(|_| AttachmentError::InvalidDestination(dest_rel.to_string()))?;

        if dest.starts_with(&self.staging_dir) || dest == self.root() {
            warn!(target: "security", dest = %dest_rel, "Refusing commit into staging or root");
            return Err(AttachmentError::InvalidDestination(dest_rel.to_string()));
        }

        let stored = self
            .resolver
            .relative(&dest)
            .ok_or_else(|| AttachmentError::InvalidDestination(dest_rel.to_string()))?;

        match fs::metadata(&dest).await {
            Ok(meta) if meta.is_dir() => {
                return Err(AttachmentError::DestinationIsDirectory(stored));
            }
            Ok(_) => {
                warn!(path = %stored, "Refusing to overwrite an existing file");
                return Err(AttachmentError::AlreadyExists(stored));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(e, &stored)),
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(e, &stored))?;
        }

        // a hard link fails instead of replacing a file created in the meantime
        match fs::hard_link(staging_path, &dest).await {
            Ok(()) => {
                if let Err(e) = fs::remove_file(staging_path).await {
                    warn!(error = %e, "cleanup_failure: staged source left behind after link");
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AttachmentError::StagedFileMissing(staged_name(staging_path)));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AttachmentError::AlreadyExists(stored));
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(AttachmentError::PermissionDenied(stored));
            }
            Err(e) => {
                // cross-device moves and filesystems without hard links
                debug!(error = %e, "Link failed, copying instead");
                self.copy_new(staging_path, &dest, &stored).await?;
                if let Err(e) = fs::remove_file(staging_path).await {
                    warn!(error = %e, "cleanup_failure: staged source left behind after copy");
                }
            }
        }

        info!(path = %stored, "Attachment committed");
        Ok(stored)
    }

    async fn copy_new(&self, staging_path: &Path, dest: &Path, stored: &str) -> AttachmentResult<()> {
        let mut source = fs::File::open(staging_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AttachmentError::StagedFileMissing(staged_name(staging_path)),
            _ => io_error(e, stored),
        })?;
        let mut target = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => AttachmentError::AlreadyExists(stored.to_string()),
                _ => io_error(e, stored),
            })?;

        let copied = async {
            tokio::io::copy(&mut source, &mut target).await?;
            target.flush().await
        }
        .await;
        if let Err(e) = copied {
            drop(target);
            if let Err(cleanup) = fs::remove_file(dest).await {
                warn!(error = %cleanup, "cleanup_failure: partial copy left behind");
            }
            return Err(io_error(e, stored));
        }
        Ok(())
    }

    /// Delete a committed file; never fails
    #[instrument(skip(self))]
    pub async fn remove_file(&self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        let Ok(absolute) = self.resolver.resolve(path) else {
            return;
        };

        match fs::remove_file(&absolute).await {
            Ok(()) => debug!("File deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "cleanup_failure: could not delete file"),
        }
    }

    /// Recursively delete a directory; never fails
    #[instrument(skip(self))]
    pub async fn remove_tree(&self, dir: &str) {
        if dir.trim().is_empty() {
            return;
        }
        let Ok(absolute) = self.resolver.resolve(dir) else {
            return;
        };
        if absolute == self.root() {
            warn!(target: "security", "Refusing to remove the storage root");
            return;
        }

        match fs::remove_dir_all(&absolute).await {
            Ok(()) => debug!("Directory deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "cleanup_failure: could not delete directory"),
        }
    }

    /// Unlink a file left in staging; never fails
    pub async fn discard_staged(&self, staging_path: &Path) {
        let absolute = lexical_normalize(staging_path);
        if !absolute.starts_with(&self.staging_dir) {
            warn!(target: "security", path = ?staging_path, "Refusing to discard a file outside staging");
            return;
        }

        match fs::remove_file(&absolute).await {
            Ok(()) => debug!(path = ?absolute, "Staged file discarded"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?absolute, error = %e, "cleanup_failure: could not discard staged file"),
        }
    }

    pub async fn discard_all(&self, staging_paths: &[PathBuf]) {
        for path in staging_paths {
            self.discard_staged(path).await;
        }
    }

    /// Locate a committed file for download
    ///
    /// Staging paths and paths outside the uploads directory are not served.
    pub async fn locate(&self, path: &str) -> AttachmentResult<PathBuf> {
        let absolute = self.resolver.resolve(path)?;
        let uploads = self.resolver.resolve(self.layout.uploads_dir())?;
        if absolute.starts_with(&self.staging_dir) || !absolute.starts_with(&uploads) {
            return Err(AttachmentError::InvalidDestination(path.to_string()));
        }

        let meta = fs::metadata(&absolute).await?;
        if !meta.is_file() {
            return Err(AttachmentError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                "not a file",
            )));
        }
        Ok(absolute)
    }
}

fn io_error(e: std::io::Error, rel: &str) -> AttachmentError {
    match e.kind() {
        ErrorKind::PermissionDenied => AttachmentError::PermissionDenied(rel.to_string()),
        _ => AttachmentError::Io(e),
    }
}

fn staged_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
