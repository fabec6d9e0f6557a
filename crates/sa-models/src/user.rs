//! User account model

use chrono::{DateTime, Utc};
use sa_attachments::{AttachmentOwner, AttachmentRef, OwnerKey, OwnerType, PhotoSlot};
use sa_core::traits::{Entity, Id, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::common::{non_blank, normalize_email};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    SuperAdmin,
    Admin,
    #[default]
    Staff,
}

/// Back-office user account
///
/// Owns a single `avatar`; users keep no documents.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,

    /// Generated code, `USER0001`
    pub user_code: String,

    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,

    #[validate(email(message = "is not a valid email address"))]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    /// Linked staff member, if any
    pub staff_code: Option<String>,

    pub avatar: Option<AttachmentRef>,

    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "is too short (minimum is 6 characters)"))]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    pub staff_code: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255, message = "can't be blank"))]
    pub full_name: Option<String>,
    #[validate(email(message = "is not a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "is too short (minimum is 6 characters)"))]
    pub password: Option<String>,
    pub role: Option<UserRole>,
    pub staff_code: Option<String>,
    pub updated_by: Option<String>,
}

impl User {
    /// Build a user; the password must already be hashed
    pub fn new(id: Id, user_code: String, params: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_code,
            full_name: params.full_name.trim().to_string(),
            email: normalize_email(&params.email),
            password_hash,
            role: params.role,
            staff_code: non_blank(params.staff_code),
            avatar: None,
            created_by: params.created_by.clone(),
            updated_by: params.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply everything except the password, which is hashed by the caller
    pub fn apply(&mut self, params: UpdateUser) {
        if let Some(full_name) = params.full_name {
            self.full_name = full_name.trim().to_string();
        }
        if let Some(email) = params.email {
            self.email = normalize_email(&email);
        }
        if params.staff_code.is_some() {
            self.staff_code = non_blank(params.staff_code);
        }
        if let Some(role) = params.role {
            self.role = role;
            // only staff accounts link to a staff member
            if role != UserRole::Staff {
                self.staff_code = None;
            }
        }
        if params.updated_by.is_some() {
            self.updated_by = params.updated_by;
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == UserRole::SuperAdmin
    }
}

impl Entity for User {
    const TYPE_NAME: &'static str = "User";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("userCode", self.user_code.clone()),
            ("email", self.email.clone()),
        ]
    }
}

impl Timestamped for User {
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

impl AttachmentOwner for User {
    fn owner_key(&self) -> OwnerKey {
        OwnerKey::new(OwnerType::User, &self.id, &self.user_code)
    }

    fn photo_slots(&self) -> &'static [PhotoSlot] {
        &[PhotoSlot::Avatar]
    }

    fn photo(&self, slot: PhotoSlot) -> Option<&AttachmentRef> {
        match slot {
            PhotoSlot::Avatar => self.avatar.as_ref(),
            _ => None,
        }
    }

    fn photo_slot_mut(&mut self, slot: PhotoSlot) -> Option<&mut Option<AttachmentRef>> {
        match slot {
            PhotoSlot::Avatar => Some(&mut self.avatar),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            "u1".into(),
            "USER0001".into(),
            NewUser {
                full_name: "Admin".into(),
                email: "ADMIN@school.edu".into(),
                password: "secret1".into(),
                role: UserRole::SuperAdmin,
                ..Default::default()
            },
            "$argon2id$stub".into(),
        )
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "admin@school.edu");
        assert_eq!(json["role"], "SuperAdmin");
    }

    #[test]
    fn test_users_have_no_documents() {
        let mut user = user();
        assert!(user.documents().is_empty());
        assert!(user.documents_mut().is_none());
        assert!(user.is_super_admin());
    }

    #[test]
    fn test_leaving_staff_role_unlinks_staff() {
        let mut user = user();
        user.apply(UpdateUser {
            role: Some(UserRole::Staff),
            staff_code: Some("STAFF0003".into()),
            ..Default::default()
        });
        assert_eq!(user.staff_code.as_deref(), Some("STAFF0003"));

        user.apply(UpdateUser {
            role: Some(UserRole::Admin),
            ..Default::default()
        });
        assert_eq!(user.staff_code, None);
    }

    #[test]
    fn test_new_user_password_length() {
        let params = NewUser {
            full_name: "A".into(),
            email: "a@b.co".into(),
            password: "123".into(),
            ..Default::default()
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
