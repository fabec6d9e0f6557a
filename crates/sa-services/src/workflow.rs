//! Record write workflow with attachment side effects
//!
//! ```text
//! create/update:  remove requested paths -> commit uploads -> write record
//!                   write ok   -> finalize (delete superseded files)
//!                   any error  -> discard staged files, roll back commits
//! delete:         remove record -> purge owner files and directory
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use sa_attachments::{
    AttachmentChanges, AttachmentManager, AttachmentOwner, AttachmentResult, UploadBatch,
};
use sa_core::traits::{Entity, Timestamped};
use sa_core::SaError;
use tracing::{info, instrument};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::{Page, Pagination, Repository};

/// Files and removal requests accompanying a record write
#[derive(Debug, Default)]
pub struct AttachmentRequest {
    /// Validated uploads already written to staging
    pub uploads: UploadBatch,
    /// Stored paths the client wants removed from the record
    pub removed_files: Vec<String>,
}

impl AttachmentRequest {
    pub fn new(uploads: UploadBatch, removed_files: Vec<String>) -> Self {
        Self {
            uploads,
            removed_files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.removed_files.is_empty()
    }
}

enum WriteMode {
    Insert,
    Update,
}

/// Drives record writes and their attachment side effects
pub struct RecordWorkflow<T: Entity> {
    repository: Arc<dyn Repository<T>>,
    attachments: Arc<AttachmentManager>,
}

impl<T> RecordWorkflow<T>
where
    T: Entity + Timestamped + AttachmentOwner,
{
    pub fn new(repository: Arc<dyn Repository<T>>, attachments: Arc<AttachmentManager>) -> Self {
        Self {
            repository,
            attachments,
        }
    }

    pub fn repository(&self) -> &dyn Repository<T> {
        self.repository.as_ref()
    }

    pub fn attachments(&self) -> &AttachmentManager {
        &self.attachments
    }

    /// Drop the staged uploads of a request that is not going ahead
    pub async fn discard(&self, request: &AttachmentRequest) {
        self.attachments
            .store()
            .discard_all(&request.uploads.paths())
            .await;
    }

    /// Pass `result` through, discarding the request's staged files on error
    pub async fn or_discard<R, E>(
        &self,
        request: &AttachmentRequest,
        result: Result<R, E>,
    ) -> ServiceResult<R>
    where
        E: Into<ServiceError>,
    {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                self.discard(request).await;
                Err(e.into())
            }
        }
    }

    /// Load a record, discarding the request's staged files when it is missing
    pub async fn load_for(&self, id: &str, request: &AttachmentRequest) -> ServiceResult<T> {
        let found = self
            .repository
            .find(id)
            .await
            .and_then(|record| record.ok_or_else(|| SaError::not_found(T::TYPE_NAME, id)));
        self.or_discard(request, found).await
    }

    #[instrument(skip_all, fields(entity = T::TYPE_NAME, id = %record.id()))]
    pub async fn create(&self, record: T, request: AttachmentRequest) -> ServiceResult<T> {
        self.write(record, request, WriteMode::Insert).await
    }

    #[instrument(skip_all, fields(entity = T::TYPE_NAME, id = %record.id()))]
    pub async fn update(&self, mut record: T, request: AttachmentRequest) -> ServiceResult<T> {
        record.touch();
        self.write(record, request, WriteMode::Update).await
    }

    /// Remove the record, then everything it stored
    #[instrument(skip(self), fields(entity = T::TYPE_NAME))]
    pub async fn delete(&self, id: &str) -> ServiceResult<T> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or_else(|| SaError::not_found(T::TYPE_NAME, id))?;

        self.attachments.purge_owner(&removed).await;
        info!("Record deleted");
        Ok(removed)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<T> {
        Ok(self
            .repository
            .find(id)
            .await?
            .ok_or_else(|| SaError::not_found(T::TYPE_NAME, id))?)
    }

    pub async fn list(&self, pagination: Pagination) -> ServiceResult<Page<T>> {
        Ok(self.repository.list(pagination).await?)
    }

    async fn write(
        &self,
        mut record: T,
        request: AttachmentRequest,
        mode: WriteMode,
    ) -> ServiceResult<T> {
        let staged = request.uploads.paths();
        let mut changes = AttachmentChanges::new();

        if let Err(e) = self.apply(&mut record, request, &mut changes).await {
            self.abort(&staged, changes).await;
            return Err(e.into());
        }

        let written = match mode {
            WriteMode::Insert => self.repository.insert(record).await,
            WriteMode::Update => self.repository.update(record).await,
        };

        match written {
            Ok(saved) => {
                self.attachments.finalize(changes).await;
                info!("Record saved");
                Ok(saved)
            }
            Err(e) => {
                self.abort(&staged, changes).await;
                Err(e.into())
            }
        }
    }

    async fn apply(
        &self,
        record: &mut T,
        request: AttachmentRequest,
        changes: &mut AttachmentChanges,
    ) -> AttachmentResult<()> {
        self.attachments
            .remove_paths(record, &request.removed_files, changes);

        let (documents, photos) = request.uploads.into_parts();
        self.attachments
            .attach_documents(record, documents, changes)
            .await?;
        for (slot, file) in photos {
            self.attachments
                .replace_photo(record, slot, file, changes)
                .await?;
        }
        Ok(())
    }

    async fn abort(&self, staged: &[PathBuf], changes: AttachmentChanges) {
        self.attachments.store().discard_all(staged).await;
        self.attachments.rollback(changes).await;
    }
}
