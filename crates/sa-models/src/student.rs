//! Student model

use chrono::{DateTime, NaiveDate, Utc};
use sa_attachments::{AttachmentOwner, AttachmentRef, OwnerKey, OwnerType, PhotoSlot};
use sa_core::traits::{Entity, Id, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{non_blank, normalize_email, Gender};

const STUDENT_SLOTS: &[PhotoSlot] = &[PhotoSlot::Student, PhotoSlot::Father, PhotoSlot::Mother];

/// Student
///
/// Owns a `documents` list plus student, father and mother photos.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Id,

    /// Generated code, `STUD0001`
    pub student_code: String,

    #[validate(length(min = 1, max = 64, message = "can't be blank"))]
    pub admission_no: String,

    pub roll_number: Option<String>,

    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,

    #[validate(email(message = "is not a valid email address"))]
    pub email: String,

    pub enrollment_status: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile: String,
    pub father_name: String,
    pub mother_name: String,
    pub guardian_name: String,
    pub class_name: String,
    pub section_name: String,

    #[serde(default)]
    pub documents: Vec<AttachmentRef>,
    pub student_photo: Option<AttachmentRef>,
    pub father_photo: Option<AttachmentRef>,
    pub mother_photo: Option<AttachmentRef>,

    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    #[validate(length(min = 1, max = 64, message = "can't be blank"))]
    pub admission_no: String,
    pub roll_number: Option<String>,
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    pub enrollment_status: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub father_name: String,
    #[serde(default)]
    pub mother_name: String,
    #[serde(default)]
    pub guardian_name: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub section_name: String,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudent {
    #[validate(length(min = 1, max = 64, message = "can't be blank"))]
    pub admission_no: Option<String>,
    pub roll_number: Option<String>,
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: Option<String>,
    #[validate(email(message = "is not a valid email address"))]
    pub email: Option<String>,
    pub enrollment_status: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub mobile: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub guardian_name: Option<String>,
    pub class_name: Option<String>,
    pub section_name: Option<String>,
    pub updated_by: Option<String>,
}

impl Student {
    pub fn new(id: Id, student_code: String, params: NewStudent) -> Self {
        let now = Utc::now();
        Self {
            id,
            student_code,
            admission_no: params.admission_no.trim().to_string(),
            roll_number: non_blank(params.roll_number),
            full_name: params.full_name.trim().to_string(),
            email: normalize_email(&params.email),
            enrollment_status: non_blank(params.enrollment_status)
                .unwrap_or_else(|| "Active".to_string()),
            gender: params.gender,
            date_of_birth: params.date_of_birth,
            mobile: params.mobile,
            father_name: params.father_name,
            mother_name: params.mother_name,
            guardian_name: params.guardian_name,
            class_name: params.class_name,
            section_name: params.section_name,
            documents: Vec::new(),
            student_photo: None,
            father_photo: None,
            mother_photo: None,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, params: UpdateStudent) {
        if let Some(admission_no) = params.admission_no {
            self.admission_no = admission_no.trim().to_string();
        }
        if params.roll_number.is_some() {
            self.roll_number = non_blank(params.roll_number);
        }
        if let Some(full_name) = params.full_name {
            self.full_name = full_name.trim().to_string();
        }
        if let Some(email) = params.email {
            self.email = normalize_email(&email);
        }
        if let Some(status) = non_blank(params.enrollment_status) {
            self.enrollment_status = status;
        }
        if params.gender.is_some() {
            self.gender = params.gender;
        }
        if params.date_of_birth.is_some() {
            self.date_of_birth = params.date_of_birth;
        }

        let text_fields = [
            (&mut self.mobile, params.mobile),
            (&mut self.father_name, params.father_name),
            (&mut self.mother_name, params.mother_name),
            (&mut self.guardian_name, params.guardian_name),
            (&mut self.class_name, params.class_name),
            (&mut self.section_name, params.section_name),
        ];
        for (field, value) in text_fields {
            if let Some(value) = value {
                *field = value;
            }
        }

        if params.updated_by.is_some() {
            self.updated_by = params.updated_by;
        }
    }
}

impl Entity for Student {
    const TYPE_NAME: &'static str = "Student";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let mut keys = vec![
            ("studentCode", self.student_code.clone()),
            ("admissionNo", self.admission_no.clone()),
            ("email", self.email.clone()),
        ];
        if let Some(roll) = &self.roll_number {
            keys.push(("rollNumber", roll.clone()));
        }
        keys
    }
}

impl Timestamped for Student {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl AttachmentOwner for Student {
    fn owner_key(&self) -> OwnerKey {
        OwnerKey::new(OwnerType::Student, &self.id, &self.student_code)
    }

    fn photo_slots(&self) -> &'static [PhotoSlot] {
        STUDENT_SLOTS
    }

    fn photo(&self, slot: PhotoSlot) -> Option<&AttachmentRef> {
        match slot {
            PhotoSlot::Student => self.student_photo.as_ref(),
            PhotoSlot::Father => self.father_photo.as_ref(),
            PhotoSlot::Mother => self.mother_photo.as_ref(),
            _ => None,
        }
    }

    fn photo_slot_mut(&mut self, slot: PhotoSlot) -> Option<&mut Option<AttachmentRef>> {
        match slot {
            PhotoSlot::Student => Some(&mut self.student_photo),
            PhotoSlot::Father => Some(&mut self.father_photo),
            PhotoSlot::Mother => Some(&mut self.mother_photo),
            _ => None,
        }
    }

    fn documents(&self) -> &[AttachmentRef] {
        &self.documents
    }

    fn documents_mut(&mut self) -> Option<&mut Vec<AttachmentRef>> {
        Some(&mut self.documents)
    }
}
