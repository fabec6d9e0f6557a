//! Staff model

use chrono::{DateTime, NaiveDate, Utc};
use sa_attachments::{AttachmentOwner, AttachmentRef, OwnerKey, OwnerType, PhotoSlot};
use sa_core::traits::{Entity, Id, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{non_blank, normalize_email, Gender};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffRole {
    #[default]
    Staff,
    Admin,
}

/// Staff member
///
/// Owns a `documents` list and a single `photo`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Id,

    /// Generated code, `STAFF0001`
    pub staff_code: String,

    /// Employee number assigned by the school (unique when set)
    pub staff_id: Option<String>,

    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,

    #[validate(email(message = "is not a valid email address"))]
    pub email: String,

    pub gender: Option<Gender>,
    pub role: StaffRole,
    pub designation: String,
    pub employment_status: String,
    pub mobile: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_joining: Option<NaiveDate>,

    #[serde(default)]
    pub documents: Vec<AttachmentRef>,
    pub photo: Option<AttachmentRef>,

    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes accepted when creating staff
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStaff {
    pub staff_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    pub gender: Option<Gender>,
    #[serde(default)]
    pub role: StaffRole,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub employment_status: String,
    #[serde(default)]
    pub mobile: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_joining: Option<NaiveDate>,
    pub created_by: Option<String>,
}

/// Attributes accepted when updating staff; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaff {
    pub staff_id: Option<String>,
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: Option<String>,
    #[validate(email(message = "is not a valid email address"))]
    pub email: Option<String>,
    pub gender: Option<Gender>,
    pub role: Option<StaffRole>,
    pub designation: Option<String>,
    pub employment_status: Option<String>,
    pub mobile: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_joining: Option<NaiveDate>,
    pub updated_by: Option<String>,
}

impl Staff {
    pub fn new(id: Id, staff_code: String, params: NewStaff) -> Self {
        let now = Utc::now();
        Self {
            id,
            staff_code,
            staff_id: non_blank(params.staff_id),
            full_name: params.full_name.trim().to_string(),
            email: normalize_email(&params.email),
            gender: params.gender,
            role: params.role,
            designation: params.designation,
            employment_status: params.employment_status,
            mobile: params.mobile,
            date_of_birth: params.date_of_birth,
            date_of_joining: params.date_of_joining,
            documents: Vec::new(),
            photo: None,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, params: UpdateStaff) {
        if params.staff_id.is_some() {
            self.staff_id = non_blank(params.staff_id);
        }
        if let Some(full_name) = params.full_name {
            self.full_name = full_name.trim().to_string();
        }
        if let Some(email) = params.email {
            self.email = normalize_email(&email);
        }
        if params.gender.is_some() {
            self.gender = params.gender;
        }
        if let Some(role) = params.role {
            self.role = role;
        }
        if let Some(designation) = params.designation {
            self.designation = designation;
        }
        if let Some(status) = params.employment_status {
            self.employment_status = status;
        }
        if let Some(mobile) = params.mobile {
            self.mobile = mobile;
        }
        if params.date_of_birth.is_some() {
            self.date_of_birth = params.date_of_birth;
        }
        if params.date_of_joining.is_some() {
            self.date_of_joining = params.date_of_joining;
        }
        if params.updated_by.is_some() {
            self.updated_by = params.updated_by;
        }
    }
}

impl Entity for Staff {
    const TYPE_NAME: &'static str = "Staff";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        let mut keys = vec![
            ("staffCode", self.staff_code.clone()),
            ("email", self.email.clone()),
        ];
        if let Some(staff_id) = &self.staff_id {
            keys.push(("staffId", staff_id.clone()));
        }
        keys
    }
}

impl Timestamped for Staff {
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

impl AttachmentOwner for Staff {
    fn owner_key(&self) -> OwnerKey {
        OwnerKey::new(OwnerType::Staff, &self.id, &self.staff_code)
    }

    fn photo_slots(&self) -> &'static [PhotoSlot] {
        &[PhotoSlot::Staff]
    }

    fn photo(&self, slot: PhotoSlot) -> Option<&AttachmentRef> {
        match slot {
            PhotoSlot::Staff => self.photo.as_ref(),
            _ => None,
        }
    }

    fn photo_slot_mut(&mut self, slot: PhotoSlot) -> Option<&mut Option<AttachmentRef>> {
        match slot {
            PhotoSlot::Staff => Some(&mut self.photo),
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

#[cfg(test)]
mod tests {
    use super::*;

    fn new_params() -> NewStaff {
        NewStaff {
            full_name: " Asha Rao ".into(),
            email: " Asha@School.EDU ".into(),
            staff_id: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_normalizes_fields() {
        let staff = Staff::new("id1".into(), "STAFF0001".into(), new_params());
        assert_eq!(staff.full_name, "Asha Rao");
        assert_eq!(staff.email, "asha@school.edu");
        assert_eq!(staff.staff_id, None);
        assert!(staff.validate().is_ok());
        assert_eq!(
            staff.unique_keys(),
            vec![
                ("staffCode", "STAFF0001".to_string()),
                ("email", "asha@school.edu".to_string())
            ]
        );
    }

    #[test]
    fn test_apply_only_changes_present_fields() {
        let mut staff = Staff::new("id1".into(), "STAFF0001".into(), new_params());
        staff.apply(UpdateStaff {
            designation: Some("Librarian".into()),
            email: Some("not-an-email".into()),
            ..Default::default()
        });

        assert_eq!(staff.designation, "Librarian");
        assert_eq!(staff.full_name, "Asha Rao");
        assert!(staff.validate().is_err());
    }

    #[test]
    fn test_owner_key_and_slots() {
        let staff = Staff::new("id1".into(), "STAFF0001".into(), new_params());
        let key = staff.owner_key();
        assert_eq!(key.owner_type, OwnerType::Staff);
        assert_eq!(key.owner_code, "STAFF0001");
        assert_eq!(staff.photo_slots(), &[PhotoSlot::Staff]);
        assert!(staff.photo(PhotoSlot::Father).is_none());
    }

    #[test]
    fn test_params_deserialize_from_form_strings() {
        let params: UpdateStaff = serde_json::from_value(serde_json::json!({
            "fullName": "B",
            "dateOfJoining": "2021-06-01",
            "role": "Admin"
        }))
        .unwrap();
        assert_eq!(params.role, Some(StaffRole::Admin));
        assert_eq!(
            params.date_of_joining,
            NaiveDate::from_ymd_opt(2021, 6, 1)
        );
    }
}
