//! Internal helpers for input validation and normalization.
//!
//! These are **not** part of the public API; they keep every entry point
//! applying the same rules before a transaction is opened.

use crate::{EngineError, Money, ResultEngine};

/// Trims and title-cases a tag (`" eXpEnSe "` → `"Expense"`).
pub(crate) fn normalize_tag(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Identifiers are database serials; zero or negative never exists.
pub(crate) fn require_id(id: i32, label: &str) -> ResultEngine<()> {
    if id <= 0 {
        return Err(EngineError::Validation(format!("{label} is required")));
    }
    Ok(())
}

pub(crate) fn require_positive(amount_minor: i64, label: &str) -> ResultEngine<Money> {
    if amount_minor <= 0 {
        return Err(EngineError::Validation(format!("{label} must be > 0")));
    }
    Ok(Money::from_minor(amount_minor))
}

pub(crate) fn require_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_note(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}
