//! Attachment lifecycle manager
//!
//! Applies staged uploads and removal requests to an owner record and tracks
//! the filesystem side effects so they can be finalized after the record write
//! succeeded or rolled back after it failed.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::{AttachmentError, AttachmentResult};
use crate::layout::{document_filename, photo_filename};
use crate::model::{AttachmentCategory, AttachmentOwner, AttachmentRef, OwnerKey, PhotoSlot};
use crate::paths::normalize_rel_path;
use crate::staging::StagedFile;
use crate::storage::AttachmentStore;

/// Filesystem side effects of one record change
#[derive(Debug, Default)]
pub struct AttachmentChanges {
    /// Paths committed during this change; deleted on rollback
    committed: Vec<String>,
    /// Paths no longer referenced; deleted on finalize
    superseded: Vec<String>,
}

impl AttachmentChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> &[String] {
        &self.committed
    }

    pub fn superseded(&self) -> &[String] {
        &self.superseded
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.superseded.is_empty()
    }

    fn supersede(&mut self, path: String) {
        if !self.superseded.contains(&path) {
            self.superseded.push(path);
        }
    }
}

/// Attachment lifecycle manager
pub struct AttachmentManager {
    store: Arc<AttachmentStore>,
}

impl AttachmentManager {
    pub fn new(store: Arc<AttachmentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    /// Commit staged documents and append them to the owner's list
    ///
    /// The list only changes when the whole batch committed.
    #[instrument(skip_all, fields(owner = %owner.owner_key(), count = staged.len()))]
    pub async fn attach_documents<O>(
        &self,
        owner: &mut O,
        staged: Vec<StagedFile>,
        changes: &mut AttachmentChanges,
    ) -> AttachmentResult<usize>
    where
        O: AttachmentOwner + ?Sized,
    {
        if staged.is_empty() {
            return Ok(0);
        }
        let key = owner.owner_key();
        if owner.documents_mut().is_none() {
            return Err(AttachmentError::UnsupportedCategory(format!(
                "{} records have no documents",
                key.owner_type
            )));
        }

        let mut refs: Vec<AttachmentRef> = Vec::with_capacity(staged.len());
        for file in staged {
            let committed = match self.commit_one(&key, AttachmentCategory::Documents, &file).await {
                Ok(path) => path,
                Err(e) => {
                    for reference in &refs {
                        self.store.remove_file(&reference.stored_path).await;
                    }
                    return Err(e);
                }
            };
            refs.push(AttachmentRef::new(file.original_name, committed));
        }

        let count = refs.len();
        changes
            .committed
            .extend(refs.iter().map(|r| r.stored_path.clone()));
        if let Some(documents) = owner.documents_mut() {
            documents.extend(refs);
        }

        info!(count, "Documents attached");
        Ok(count)
    }

    /// Commit a new photo into a slot and queue the previous one for deletion
    #[instrument(skip_all, fields(owner = %owner.owner_key(), slot = ?slot))]
    pub async fn replace_photo<O>(
        &self,
        owner: &mut O,
        slot: PhotoSlot,
        staged: StagedFile,
        changes: &mut AttachmentChanges,
    ) -> AttachmentResult<AttachmentRef>
    where
        O: AttachmentOwner + ?Sized,
    {
        let key = owner.owner_key();
        if !owner.photo_slots().contains(&slot) {
            return Err(AttachmentError::UnsupportedCategory(format!(
                "{} records have no {:?} photo",
                key.owner_type, slot
            )));
        }

        let committed = self
            .commit_one(&key, AttachmentCategory::Photo(slot), &staged)
            .await?;
        changes.committed.push(committed.clone());

        let new_ref = AttachmentRef::new(staged.original_name, committed.clone());
        let previous = owner
            .photo_slot_mut(slot)
            .and_then(|current| current.replace(new_ref.clone()));

        if let Some(previous) = previous {
            if !previous.matches(&committed) {
                changes.supersede(normalize_rel_path(&previous.stored_path));
            }
        }

        info!(path = %committed, "Photo replaced");
        Ok(new_ref)
    }

    /// Drop references the client asked to remove and queue their files
    ///
    /// Paths the owner does not reference are ignored.
    #[instrument(skip_all, fields(owner = %owner.owner_key()))]
    pub fn remove_paths<O>(
        &self,
        owner: &mut O,
        requested: &[String],
        changes: &mut AttachmentChanges,
    ) -> usize
    where
        O: AttachmentOwner + ?Sized,
    {
        let mut removed = 0;
        for raw in requested {
            let wanted = normalize_rel_path(raw.trim());
            if wanted.is_empty() {
                continue;
            }

            let mut matched = false;
            if let Some(documents) = owner.documents_mut() {
                let before = documents.len();
                documents.retain(|d| !d.matches(&wanted));
                matched |= documents.len() != before;
            }
            for slot in owner.photo_slots() {
                if let Some(current) = owner.photo_slot_mut(*slot) {
                    if current.as_ref().is_some_and(|r| r.matches(&wanted)) {
                        *current = None;
                        matched = true;
                    }
                }
            }

            if matched {
                debug!(path = %wanted, "Reference removed");
                changes.supersede(wanted);
                removed += 1;
            } else {
                warn!(path = %wanted, "Ignoring removal of a path the owner does not reference");
            }
        }
        removed
    }

    /// Delete superseded files once the record write succeeded
    pub async fn finalize(&self, changes: AttachmentChanges) {
        for path in &changes.superseded {
            self.store.remove_file(path).await;
        }
    }

    /// Delete files committed for a record write that failed
    pub async fn rollback(&self, changes: AttachmentChanges) {
        if !changes.committed.is_empty() {
            warn!(count = changes.committed.len(), "Rolling back committed attachments");
        }
        for path in &changes.committed {
            self.store.remove_file(path).await;
        }
    }

    /// Delete every file of a removed owner, then its directory
    #[instrument(skip_all, fields(owner = %owner.owner_key()))]
    pub async fn purge_owner<O>(&self, owner: &O)
    where
        O: AttachmentOwner + ?Sized,
    {
        for reference in owner.attachments() {
            self.store.remove_file(&reference.stored_path).await;
        }
        match self.store.layout().owner_dir(&owner.owner_key()) {
            Ok(dir) => self.store.remove_tree(&dir).await,
            Err(e) => warn!(error = %e, "cleanup_failure: owner directory not derivable"),
        }
        info!("Owner attachments purged");
    }

    async fn commit_one(
        &self,
        key: &OwnerKey,
        category: AttachmentCategory,
        file: &StagedFile,
    ) -> AttachmentResult<String> {
        let filename = match category {
            AttachmentCategory::Documents => document_filename(&file.original_name),
            AttachmentCategory::Photo(slot) => photo_filename(slot, &file.original_name),
        };
        let dest = self.store.layout().path_for(key, category, &filename)?;
        self.store.commit(&file.path, &dest).await
    }
}
