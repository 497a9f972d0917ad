//! Internal helpers for input normalization.
//!
//! These utilities are **not** part of the public API.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::ValidationError;

/// Lowercase, accent-free key with runs of non-alphanumerics collapsed to a
/// single space. `None` when nothing is left.
pub fn normalize_key(input: &str) -> Option<String> {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_folds_case_accents_and_punctuation() {
        assert_eq!(normalize_key("  Lácteos & Huevos ").as_deref(), Some("lacteos huevos"));
        assert_eq!(normalize_key("fruits_vegetables").as_deref(), Some("fruits vegetables"));
        assert_eq!(normalize_key(" - "), None);
    }

    #[test]
    fn required_text_rejects_blank() {
        assert_eq!(
            required_text("   ", "name"),
            Err(ValidationError::MissingField("name"))
        );
        assert_eq!(required_text(" Milk ", "name").unwrap(), "Milk");
        assert_eq!(optional_text(Some("  ")), None);
    }
}
