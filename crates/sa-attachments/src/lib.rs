//! # sa-attachments
//!
//! Attachment lifecycle handling for School Admin RS.
//!
//! ## Features
//!
//! - Jailed storage root: every path goes through [`PathResolver`] first
//! - Staging area for uploads that are not yet owned by a record
//! - Move-in from staging to a deterministic per-owner layout
//! - Replacement of single-valued photo slots and cascade deletion
//!
//! ## Layout
//!
//! ```text
//! uploads/
//! ├── temp/                         # staging, never a commit target
//! ├── staff/<code>/<id>/documents/<millis>-<rand>.pdf
//! ├── staff/<code>/<id>/photo/photo-<millis>.jpg
//! ├── students/<code>/<id>/photo/{student,father,mother}/...
//! └── users/<code>/<id>/avatar/avatar-<millis>.png
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sa_attachments::{AttachmentChanges, AttachmentManager, AttachmentStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(AttachmentStore::new("/srv/school", "uploads", "uploads/temp")?);
//! let manager = AttachmentManager::new(store);
//!
//! let mut changes = AttachmentChanges::default();
//! manager.attach_documents(&mut student, staged_documents, &mut changes).await?;
//! match repository.update(&student).await {
//!     Ok(_) => manager.finalize(changes).await,
//!     Err(_) => manager.rollback(changes).await,
//! }
//! ```

pub mod error;
pub mod layout;
pub mod model;
pub mod paths;
pub mod service;
pub mod staging;
pub mod storage;
pub mod validator;

pub use error::{AttachmentError, AttachmentResult};
pub use layout::{document_filename, photo_filename, safe_extension, Layout};
pub use model::{
    AttachmentCategory, AttachmentOwner, AttachmentRef, OwnerKey, OwnerType, PhotoSlot,
};
pub use paths::{lexical_normalize, normalize_rel_path, PathResolver};
pub use service::{AttachmentChanges, AttachmentManager};
pub use staging::{StagedFile, StagingArea, StagingWriter, UploadBatch};
pub use storage::AttachmentStore;
pub use validator::{effective_mime, UploadKind, UploadRejection, UploadValidator};
