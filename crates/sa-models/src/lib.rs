//! # sa-models
//!
//! Domain models for School Admin RS.
//!
//! Records that own attachments implement [`AttachmentOwner`] so the
//! attachment lifecycle manager can work on them without knowing their fields.

pub use sa_attachments::{AttachmentOwner, AttachmentRef, OwnerKey, OwnerType, PhotoSlot};
pub use sa_core::traits::{Entity, Id, Timestamped};

pub mod common;
pub mod staff;
pub mod student;
pub mod user;

pub use common::Gender;
pub use staff::{NewStaff, Staff, StaffRole, UpdateStaff};
pub use student::{NewStudent, Student, UpdateStudent};
pub use user::{NewUser, UpdateUser, User, UserRole};
