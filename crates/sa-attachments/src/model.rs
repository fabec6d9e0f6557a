//! Attachment model
//!
//! Owners (staff, students, users) hold [`AttachmentRef`]s in a multi-valued
//! `documents` list and in single-valued photo slots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paths::normalize_rel_path;

/// Reference to a committed file, persisted on the owner record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    /// File name as sent by the client
    pub original_name: String,
    /// Forward-slash path relative to the storage root
    #[serde(rename = "path")]
    pub stored_path: String,
    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentRef {
    pub fn new(original_name: impl Into<String>, stored_path: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            stored_path: stored_path.into(),
            uploaded_at: Utc::now(),
        }
    }

    /// Compare against an already-normalised relative path
    pub fn matches(&self, normalized: &str) -> bool {
        normalize_rel_path(&self.stored_path) == normalized
    }

    /// Final path segment of the stored file
    pub fn file_name(&self) -> &str {
        self.stored_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.stored_path)
    }
}

/// Entity kinds that own attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum OwnerType {
    Staff,
    Student,
    User,
}

impl OwnerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Student => "Student",
            Self::User => "User",
        }
    }

    /// Directory name under the uploads root
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Student => "students",
            Self::User => "users",
        }
    }
}

impl std::fmt::Display for OwnerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of an owner for storage purposes
///
/// `owner_code` groups storage by business code; `owner_id` keeps two owners
/// apart even when a code is reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey {
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub owner_code: String,
}

impl OwnerKey {
    pub fn new(
        owner_type: OwnerType,
        owner_id: impl Into<String>,
        owner_code: impl Into<String>,
    ) -> Self {
        Self {
            owner_type,
            owner_id: owner_id.into(),
            owner_code: owner_code.into(),
        }
    }
}

impl std::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}/{}", self.owner_type, self.owner_code, self.owner_id)
    }
}

/// Single-valued photo slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSlot {
    Student,
    Father,
    Mother,
    Staff,
    Avatar,
}

impl PhotoSlot {
    pub fn owner_type(&self) -> OwnerType {
        match self {
            Self::Student | Self::Father | Self::Mother => OwnerType::Student,
            Self::Staff => OwnerType::Staff,
            Self::Avatar => OwnerType::User,
        }
    }

    /// Multipart field name that fills this slot
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Student => "studentPhoto",
            Self::Father => "fatherPhoto",
            Self::Mother => "motherPhoto",
            Self::Staff => "photo",
            Self::Avatar => "avatar",
        }
    }

    /// Stem of generated file names for this slot
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Student => "student-photo",
            Self::Father => "father-photo",
            Self::Mother => "mother-photo",
            Self::Staff => "photo",
            Self::Avatar => "avatar",
        }
    }
}

/// Where under an owner's directory a file lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentCategory {
    Documents,
    Photo(PhotoSlot),
}

impl AttachmentCategory {
    /// Directory segments below `<owner_id>/`
    pub fn segments(&self) -> &'static [&'static str] {
        match self {
            Self::Documents => &["documents"],
            Self::Photo(PhotoSlot::Student) => &["photo", "student"],
            Self::Photo(PhotoSlot::Father) => &["photo", "father"],
            Self::Photo(PhotoSlot::Mother) => &["photo", "mother"],
            Self::Photo(PhotoSlot::Staff) => &["photo"],
            Self::Photo(PhotoSlot::Avatar) => &["avatar"],
        }
    }

    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::Documents)
    }
}

/// Records that own attachments
///
/// Implemented by the entity records; the lifecycle manager works through this
/// trait and never touches entity-specific fields.
pub trait AttachmentOwner {
    fn owner_key(&self) -> OwnerKey;

    /// Photo slots this owner supports
    fn photo_slots(&self) -> &'static [PhotoSlot];

    fn photo(&self, slot: PhotoSlot) -> Option<&AttachmentRef>;

    /// Mutable access to a slot; `None` when the owner has no such slot
    fn photo_slot_mut(&mut self, slot: PhotoSlot) -> Option<&mut Option<AttachmentRef>>;

    fn documents(&self) -> &[AttachmentRef] {
        &[]
    }

    /// `None` when the owner does not keep documents
    fn documents_mut(&mut self) -> Option<&mut Vec<AttachmentRef>> {
        None
    }

    /// Every reference held by this owner
    fn attachments(&self) -> Vec<&AttachmentRef> {
        let mut all: Vec<&AttachmentRef> = self.documents().iter().collect();
        all.extend(self.photo_slots().iter().filter_map(|slot| self.photo(*slot)));
        all
    }
}
