//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//!
//! [`FormatError`] covers every input-shape rejection: filenames outside the
//! naming convention, malformed owner identifiers, and digests that do not
//! decode. It is raised before any network call and is never retried.
//!
//! [`DirectoryError`] is the one failure of principal resolution.

use thiserror::Error;

/// A principal directory could not answer.
///
/// Distinct from "no such principal", which resolves to `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("principal directory unavailable: {0}")]
pub struct DirectoryError(
    /// What went wrong, e.g. the upstream status.
    pub String,
);

/// Input-shape errors.
///
/// Each variant carries the offending input so operators can see exactly
/// which file or field was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Filename does not follow `<OWNER>_<Type>.<ext>`.
    #[error("invalid file name \"{name}\": {reason} (expected e.g. DL1234_Degree-Certificate.pdf)")]
    InvalidFileName {
        /// The rejected name, after directory components were stripped.
        name: String,
        /// Which part of the convention was violated.
        reason: &'static str,
    },

    /// Owner identifier is not two uppercase letters followed by four digits.
    #[error("invalid owner id: \"{0}\" (expected two uppercase letters and four digits)")]
    InvalidOwnerId(String),

    /// Document type label is empty or contains characters other than
    /// letters, whitespace, and hyphens.
    #[error("invalid document type: \"{0}\" (expected letters, spaces, or hyphens)")]
    InvalidDocumentType(String),

    /// A digest string did not decode to 32 bytes.
    #[error("invalid content hash: \"{0}\" (expected base64 SHA-256)")]
    InvalidDigest(String),

    /// The hash supplied by the caller differs from the hash of the bytes.
    #[error("content hash mismatch: claimed {claimed}, computed {computed}")]
    HashMismatch {
        /// Hash the caller sent.
        claimed: String,
        /// Hash of the bytes actually received.
        computed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_error_names_the_file() {
        let err = FormatError::InvalidFileName {
            name: "certificate.pdf".into(),
            reason: "missing owner prefix",
        };
        let msg = err.to_string();
        assert!(msg.contains("certificate.pdf"));
        assert!(msg.contains("missing owner prefix"));
    }

    #[test]
    fn owner_id_error_display() {
        let err = FormatError::InvalidOwnerId("dl1234".into());
        assert!(err.to_string().contains("dl1234"));
    }

    #[test]
    fn hash_mismatch_shows_both_sides() {
        let err = FormatError::HashMismatch {
            claimed: "aaa=".into(),
            computed: "bbb=".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("aaa="));
        assert!(msg.contains("bbb="));
    }

    #[test]
    fn directory_error_display() {
        let err = DirectoryError("identity service returned 503".into());
        assert_eq!(
            err.to_string(),
            "principal directory unavailable: identity service returned 503"
        );
    }
}
