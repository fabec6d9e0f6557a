//! Upload validation
//!
//! Decides, before any byte reaches staging, whether an upload field is known
//! for the owner type, whether its MIME type fits the category and whether the
//! declared size is within the cap.

use sa_core::config::UploadLimits;
use thiserror::Error;

use crate::model::{AttachmentCategory, OwnerType, PhotoSlot};

pub const IMAGE_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Why an upload was refused
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Unexpected file field '{field}'")]
    UnexpectedField { field: String },
    #[error("Invalid file type for {field}: only images are allowed")]
    NotAnImage { field: String, mime: String },
    #[error("Invalid file type for {field}: allowed are pdf, doc, docx, txt and images")]
    NotADocument { field: String, mime: String },
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
    #[error("Too many files for {field} (max: {max})")]
    TooManyFiles { field: String, max: usize },
}

/// Classification of an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    Document,
    Photo(PhotoSlot),
}

impl UploadKind {
    pub fn category(&self) -> AttachmentCategory {
        match self {
            Self::Document => AttachmentCategory::Documents,
            Self::Photo(slot) => AttachmentCategory::Photo(*slot),
        }
    }
}

/// Declared content type, or a guess from the file name when absent
pub fn effective_mime(declared: Option<&str>, file_name: &str) -> String {
    match declared.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Validates uploads for one owner type
#[derive(Debug, Clone)]
pub struct UploadValidator {
    owner_type: OwnerType,
    limits: UploadLimits,
}

impl UploadValidator {
    pub fn new(owner_type: OwnerType, limits: UploadLimits) -> Self {
        Self { owner_type, limits }
    }

    pub fn owner_type(&self) -> OwnerType {
        self.owner_type
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Map a multipart field name onto a category
    pub fn classify_field(&self, field: &str) -> Result<UploadKind, UploadRejection> {
        let kind = match (self.owner_type, field) {
            (OwnerType::Staff | OwnerType::Student, "documents" | "document") => {
                UploadKind::Document
            }
            (OwnerType::Staff, "photo") => UploadKind::Photo(PhotoSlot::Staff),
            (OwnerType::Student, "studentPhoto" | "photo") => UploadKind::Photo(PhotoSlot::Student),
            (OwnerType::Student, "fatherPhoto") => UploadKind::Photo(PhotoSlot::Father),
            (OwnerType::Student, "motherPhoto") => UploadKind::Photo(PhotoSlot::Mother),
            (OwnerType::User, "avatar") => UploadKind::Photo(PhotoSlot::Avatar),
            _ => {
                return Err(UploadRejection::UnexpectedField {
                    field: field.to_string(),
                })
            }
        };
        Ok(kind)
    }

    /// Per-file cap for a category
    pub fn max_size(&self, kind: UploadKind) -> u64 {
        match kind {
            UploadKind::Document => self.limits.max_document_size,
            UploadKind::Photo(_) => self.limits.max_photo_size,
        }
    }

    /// Accept or reject an upload; `size` is `None` when not yet known
    pub fn validate_and_classify(
        &self,
        field: &str,
        mime: &str,
        size: Option<u64>,
    ) -> Result<UploadKind, UploadRejection> {
        let kind = self.classify_field(field)?;
        let essence = essence(mime);

        let is_image = IMAGE_MIME_TYPES.contains(&essence.as_str());
        match kind {
            UploadKind::Photo(_) if !is_image => {
                return Err(UploadRejection::NotAnImage {
                    field: field.to_string(),
                    mime: essence,
                })
            }
            UploadKind::Document if !is_image && !DOCUMENT_MIME_TYPES.contains(&essence.as_str()) => {
                return Err(UploadRejection::NotADocument {
                    field: field.to_string(),
                    mime: essence,
                })
            }
            _ => {}
        }

        if let Some(size) = size {
            let max = self.max_size(kind);
            if size > max {
                return Err(UploadRejection::FileTooLarge { size, max });
            }
        }

        Ok(kind)
    }
}

/// `type/subtype` without parameters, lower-cased; empty when unparseable
fn essence(mime: &str) -> String {
    mime.parse::<mime::Mime>()
        .map(|m| m.essence_str().to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(owner_type: OwnerType) -> UploadValidator {
        UploadValidator::new(owner_type, UploadLimits::default())
    }

    #[test]
    fn test_student_fields() {
        let v = validator(OwnerType::Student);
        assert_eq!(
            v.validate_and_classify("fatherPhoto", "image/png", Some(10)),
            Ok(UploadKind::Photo(PhotoSlot::Father))
        );
        assert_eq!(
            v.validate_and_classify("photo", "image/jpeg", None),
            Ok(UploadKind::Photo(PhotoSlot::Student))
        );
        assert_eq!(
            v.validate_and_classify("documents", "application/pdf", Some(10)),
            Ok(UploadKind::Document)
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let v = validator(OwnerType::User);
        assert!(matches!(
            v.validate_and_classify("documents", "application/pdf", None),
            Err(UploadRejection::UnexpectedField { .. })
        ));
        assert!(matches!(
            validator(OwnerType::Staff).validate_and_classify("fatherPhoto", "image/png", None),
            Err(UploadRejection::UnexpectedField { .. })
        ));
    }

    #[test]
    fn test_photo_requires_image() {
        let v = validator(OwnerType::Staff);
        assert!(matches!(
            v.validate_and_classify("photo", "application/pdf", Some(1)),
            Err(UploadRejection::NotAnImage { .. })
        ));
        assert_eq!(
            v.validate_and_classify("photo", "image/svg+xml", Some(1)),
            Ok(UploadKind::Photo(PhotoSlot::Staff))
        );
    }

    #[test]
    fn test_documents_accept_images_and_office_types() {
        let v = validator(OwnerType::Staff);
        for mime in [
            "application/pdf",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "text/plain; charset=utf-8",
            "image/webp",
        ] {
            assert_eq!(
                v.validate_and_classify("documents", mime, Some(1)),
                Ok(UploadKind::Document),
                "{mime}"
            );
        }
        assert!(matches!(
            v.validate_and_classify("documents", "application/x-msdownload", Some(1)),
            Err(UploadRejection::NotADocument { .. })
        ));
        assert!(v.validate_and_classify("documents", "not a mime", Some(1)).is_err());
    }

    #[test]
    fn test_size_caps() {
        let v = validator(OwnerType::User);
        let max = UploadLimits::default().max_photo_size;
        assert!(v.validate_and_classify("avatar", "image/png", Some(max)).is_ok());
        assert_eq!(
            v.validate_and_classify("avatar", "image/png", Some(max + 1)),
            Err(UploadRejection::FileTooLarge { size: max + 1, max })
        );

        let docs = validator(OwnerType::Student);
        let doc_max = UploadLimits::default().max_document_size;
        assert!(docs
            .validate_and_classify("documents", "application/pdf", Some(doc_max + 1))
            .is_err());
    }

    #[test]
    fn test_effective_mime() {
        assert_eq!(effective_mime(Some("image/png"), "x.pdf"), "image/png");
        assert_eq!(effective_mime(None, "scan.pdf"), "application/pdf");
        assert_eq!(effective_mime(Some(" "), "photo.JPG"), "image/jpeg");
        assert_eq!(effective_mime(None, "blob"), "application/octet-stream");
    }
}
