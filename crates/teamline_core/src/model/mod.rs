//! Domain model for users, projects, tasks, labels and statuses.
//!
//! # Responsibility
//! - Define the canonical document shapes persisted by the store layer.
//! - Provide field validation gates shared by write and read-back paths.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID that is never reused.
//! - Cross-entity references are plain typed ids; existence is checked at
//!   the use site, never assumed.
//! - Id sets serialize deterministically (`BTreeSet` ordering).

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod label;
pub mod project;
pub mod status;
pub mod task;
pub mod user;

/// Entity discriminator used in errors and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Project,
    Task,
    Label,
    Status,
}

impl EntityKind {
    /// Lowercase noun used in log lines and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Task => "task",
            Self::Label => "label",
            Self::Status => "status",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure raised before any persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace-only.
    BlankField {
        entity: EntityKind,
        field: &'static str,
    },
    /// Text field length is outside its allowed range (in chars).
    FieldLength {
        entity: EntityKind,
        field: &'static str,
        min: usize,
        max: usize,
    },
    /// Email does not match the accepted format.
    InvalidEmail(String),
    /// Color is not a `#RRGGBB` value.
    InvalidColor(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { entity, field } => {
                write!(f, "{entity} field `{field}` must not be blank")
            }
            Self::FieldLength {
                entity,
                field,
                min,
                max,
            } => write!(
                f,
                "{entity} field `{field}` length must be in range [{min}-{max}]"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email format: `{value}`"),
            Self::InvalidColor(value) => write!(f, "invalid color `{value}`; expected #RRGGBB"),
        }
    }
}

impl Error for ValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Document timestamps are set in code because the store persists entities
/// as opaque JSON documents.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

pub(crate) fn require_non_blank(
    entity: EntityKind,
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { entity, field });
    }
    Ok(())
}

pub(crate) fn require_length(
    entity: EntityKind,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let chars = value.chars().count();
    if chars < min || chars > max {
        return Err(ValidationError::FieldLength {
            entity,
            field,
            min,
            max,
        });
    }
    Ok(())
}

static HEX_COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color regex"));

pub(crate) fn require_hex_color(value: &str) -> Result<(), ValidationError> {
    if !HEX_COLOR_RE.is_match(value) {
        return Err(ValidationError::InvalidColor(value.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{now_epoch_ms, require_hex_color, require_length, EntityKind, ValidationError};

    #[test]
    fn now_epoch_ms_is_after_2020() {
        assert!(now_epoch_ms() > 1_577_836_800_000);
    }

    #[test]
    fn hex_color_requires_full_six_digit_form() {
        assert!(require_hex_color("#A1b2C3").is_ok());
        assert!(matches!(
            require_hex_color("red").unwrap_err(),
            ValidationError::InvalidColor(_)
        ));
        assert!(require_hex_color("#fff").is_err());
    }

    #[test]
    fn require_length_counts_chars_not_bytes() {
        assert!(require_length(EntityKind::User, "username", "über", 3, 10).is_ok());
        let err = require_length(EntityKind::User, "username", "ab", 3, 10).unwrap_err();
        assert!(matches!(err, ValidationError::FieldLength { min: 3, .. }));
    }
}
