//! Owner directory layout and generated file names

use std::path::Path;

use chrono::Utc;

use crate::error::{AttachmentError, AttachmentResult};
use crate::model::{AttachmentCategory, OwnerKey, OwnerType, PhotoSlot};

/// Deterministic per-owner layout below the uploads directory
///
/// `<uploads>/<plural>/<owner_code>/<owner_id>/<category segments>/<filename>`
#[derive(Debug, Clone)]
pub struct Layout {
    uploads_dir: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("uploads")
    }
}

impl Layout {
    pub fn new(uploads_dir: impl Into<String>) -> Self {
        let uploads_dir = uploads_dir.into();
        Self {
            uploads_dir: uploads_dir.trim_end_matches(['/', '\\']).to_string(),
        }
    }

    pub fn uploads_dir(&self) -> &str {
        &self.uploads_dir
    }

    /// Relative path for a file of an owner
    pub fn layout_for(
        &self,
        owner_type: OwnerType,
        owner_code: &str,
        owner_id: &str,
        category: AttachmentCategory,
        filename: &str,
    ) -> AttachmentResult<String> {
        let mut parts = vec![
            self.uploads_dir.as_str(),
            owner_type.dir_name(),
            checked_segment(owner_code)?,
            checked_segment(owner_id)?,
        ];
        parts.extend_from_slice(category.segments());
        parts.push(checked_segment(filename)?);
        Ok(parts.join("/"))
    }

    pub fn path_for(
        &self,
        key: &OwnerKey,
        category: AttachmentCategory,
        filename: &str,
    ) -> AttachmentResult<String> {
        self.layout_for(
            key.owner_type,
            &key.owner_code,
            &key.owner_id,
            category,
            filename,
        )
    }

    /// Directory holding everything of one owner
    pub fn owner_dir(&self, key: &OwnerKey) -> AttachmentResult<String> {
        Ok(format!(
            "{}/{}/{}/{}",
            self.uploads_dir,
            key.owner_type.dir_name(),
            checked_segment(&key.owner_code)?,
            checked_segment(&key.owner_id)?
        ))
    }
}

/// Codes, ids and file names become single path segments
fn checked_segment(segment: &str) -> AttachmentResult<&str> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(AttachmentError::InvalidDestination(format!(
            "invalid path segment '{}'",
            segment
        )));
    }
    Ok(segment)
}

/// Lower-cased extension of the client file name, with the leading dot
///
/// Returns an empty string when there is no usable extension.
pub fn safe_extension(original_name: &str) -> String {
    let name = original_name.rsplit(['/', '\\']).next().unwrap_or(original_name);
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 16)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn random_suffix() -> u32 {
    rand::random::<u32>() % 1_000_000_000
}

/// `<unix_millis>-<random below 1e9><ext>`, used for documents and staging files
pub fn document_filename(original_name: &str) -> String {
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        random_suffix(),
        safe_extension(original_name)
    )
}

/// `<slot stem>-<unix_millis>-<random below 1e9><ext>`, used for single-valued slots
pub fn photo_filename(slot: PhotoSlot, original_name: &str) -> String {
    format!(
        "{}-{}-{}{}",
        slot.file_stem(),
        Utc::now().timestamp_millis(),
        random_suffix(),
        safe_extension(original_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_document_layout() {
        let path = Layout::default()
            .layout_for(
                OwnerType::Student,
                "STUD0007",
                "507f1f77bcf86cd799439011",
                AttachmentCategory::Documents,
                "1700000000-123456789.pdf",
            )
            .unwrap();
        assert_eq!(
            path,
            "uploads/students/STUD0007/507f1f77bcf86cd799439011/documents/1700000000-123456789.pdf"
        );
    }

    #[test]
    fn test_photo_layouts() {
        let layout = Layout::default();
        let father = layout
            .layout_for(
                OwnerType::Student,
                "STUD0001",
                "abc",
                AttachmentCategory::Photo(PhotoSlot::Father),
                "father-photo-1.jpg",
            )
            .unwrap();
        assert_eq!(father, "uploads/students/STUD0001/abc/photo/father/father-photo-1.jpg");

        let staff = layout
            .layout_for(
                OwnerType::Staff,
                "STAFF0002",
                "def",
                AttachmentCategory::Photo(PhotoSlot::Staff),
                "photo-1.png",
            )
            .unwrap();
        assert_eq!(staff, "uploads/staff/STAFF0002/def/photo/photo-1.png");

        let avatar = layout
            .layout_for(
                OwnerType::User,
                "USER0003",
                "ghi",
                AttachmentCategory::Photo(PhotoSlot::Avatar),
                "avatar-1.webp",
            )
            .unwrap();
        assert_eq!(avatar, "uploads/users/USER0003/ghi/avatar/avatar-1.webp");
    }

    #[test]
    fn test_owner_dir() {
        let key = OwnerKey::new(OwnerType::Staff, "id1", "STAFF0001");
        assert_eq!(
            Layout::new("files/").owner_dir(&key).unwrap(),
            "files/staff/STAFF0001/id1"
        );
    }

    #[test]
    fn test_rejects_unsafe_segments() {
        let layout = Layout::default();
        for bad in ["..", "a/b", "a\\b", ""] {
            assert!(layout
                .layout_for(
                    OwnerType::Staff,
                    bad,
                    "id",
                    AttachmentCategory::Documents,
                    "f.pdf"
                )
                .is_err());
        }
        assert!(layout
            .layout_for(
                OwnerType::Staff,
                "S",
                "id",
                AttachmentCategory::Documents,
                "../f.pdf"
            )
            .is_err());
    }

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension("Report.PDF"), ".pdf");
        assert_eq!(safe_extension("archive.tar.gz"), ".gz");
        assert_eq!(safe_extension("noext"), "");
        assert_eq!(safe_extension("weird.p/df"), "");
        assert_eq!(safe_extension("evil.ph p"), "");
        assert_eq!(safe_extension("C:\\docs\\scan.JPG"), ".jpg");
    }

    #[test]
    fn test_generated_names() {
        let doc = document_filename("scan.pdf");
        let (millis, rest) = doc.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(rest.ends_with(".pdf"));
        let random: u32 = rest.trim_end_matches(".pdf").parse().unwrap();
        assert!(random < 1_000_000_000);

        let photo = photo_filename(PhotoSlot::Mother, "m.png");
        let rest = photo.strip_prefix("mother-photo-").unwrap();
        let (millis, random) = rest.trim_end_matches(".png").split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(random.parse::<u32>().unwrap() < 1_000_000_000);
        assert!(photo.ends_with(".png"));
    }

    #[test]
    fn test_photo_names_differ_within_one_millisecond() {
        let names: std::collections::HashSet<String> = (0..64)
            .map(|_| photo_filename(PhotoSlot::Avatar, "a.png"))
            .collect();
        assert_eq!(names.len(), 64);
    }
}
