//! # sa-services
//!
//! Record workflows for School Admin RS.
//!
//! Each create/update/delete drives the attachment lifecycle around the record
//! write: uploads are committed before the write, superseded files are deleted
//! after it succeeded, and new files are rolled back when it failed.

pub mod error;
pub mod password;
pub mod repository;
pub mod staff;
pub mod students;
pub mod users;
pub mod workflow;

pub use error::{ServiceError, ServiceResult};
pub use repository::{MemoryRepository, Page, Pagination, Repository};
pub use staff::StaffService;
pub use students::StudentService;
pub use users::UserService;
pub use workflow::{AttachmentRequest, RecordWorkflow};
