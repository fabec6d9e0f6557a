//! # sa-api
//!
//! REST API handlers for School Admin RS.
//!
//! Record endpoints accept `multipart/form-data`: text fields become the
//! record parameters and file fields are validated and streamed to staging
//! before the service layer commits them.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod multipart;
pub mod routes;

pub use extractors::AppState;
pub use routes::router;
