//! API request handlers

pub mod files;
pub mod staff;
pub mod students;
pub mod users;
