//! # Identifier Newtypes
//!
//! [`OwnerId`] and [`DocumentType`] validate at construction, so a value of
//! either type always satisfies the naming convention's rules for that
//! segment. Both can be built from a parsed filename or directly from a form
//! field.

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Owner identifier: two uppercase ASCII letters followed by four ASCII
/// digits, e.g. `DL1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner id, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidOwnerId`] unless the value is exactly
    /// `[A-Z]{2}[0-9]{4}`.
    pub fn new(value: impl Into<String>) -> Result<Self, FormatError> {
        let s = value.into();
        if is_owner_id(&s) {
            Ok(Self(s))
        } else {
            Err(FormatError::InvalidOwnerId(s))
        }
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_owner_id(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 6 && b[..2].iter().all(u8::is_ascii_uppercase) && b[2..].iter().all(u8::is_ascii_digit)
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

/// Document-type label, e.g. `Degree-Certificate` or `Transcript`.
///
/// Letters, hyphens, and whitespace only; never empty. Underscores are
/// excluded because the underscore separates owner and type in filenames.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentType(String);

impl DocumentType {
    /// Create a document type, validating its character set.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidDocumentType`] if the label is empty or
    /// contains a character outside letters, whitespace, and `-`.
    pub fn new(value: impl Into<String>) -> Result<Self, FormatError> {
        let s = value.into();
        if !s.is_empty() && s.chars().all(is_type_char) {
            Ok(Self(s))
        } else {
            Err(FormatError::InvalidDocumentType(s))
        }
    }

    /// Access the label.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentType {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentType> for String {
    fn from(t: DocumentType) -> Self {
        t.0
    }
}

/// Characters allowed in a type label: ASCII letters, `-`, and the
/// ECMAScript `\s` whitespace class.
pub(crate) fn is_type_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || is_ecma_whitespace(c)
}

fn is_ecma_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
