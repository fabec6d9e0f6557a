//! Shared value types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Trim and lower-case an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `None` for blank strings, trimmed otherwise
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
