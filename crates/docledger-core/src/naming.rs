//! # Document Naming Convention
//!
//! Issued files are named `<OWNER>_<Type>.<ext>`, for example
//! `DL1234_Degree-Certificate.pdf`. The owner id embedded in the name is the
//! only key that links a file presented for verification back to the records
//! created when it was issued, so the grammar is enforced exactly:
//!
//! ```text
//! ^[A-Z]{2}\d{4}_[A-Za-z\s-]+\.[A-Za-z0-9]+$
//! ```
//!
//! Directory components (anything up to the last `/` or `\`) are stripped
//! first, which lets archive entry paths such as `batch/DL1234_Transcript.pdf`
//! be parsed directly.

use serde::Serialize;

use crate::error::FormatError;
use crate::identity::{is_owner_id, is_type_char, DocumentType, OwnerId};

/// Components recovered from a conforming filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedName {
    /// Owner the document was issued to.
    pub owner_id: OwnerId,
    /// Type label between the underscore and the extension dot.
    pub document_type: DocumentType,
    /// Extension without the leading dot.
    pub extension: String,
}

impl ParsedName {
    /// Render back to `<OWNER>_<Type>.<ext>`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.owner_id, self.document_type, self.extension)
    }
}

/// Strip directory components, keeping the final path segment.
pub fn base_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Parse a filename against the naming convention.
///
/// # Errors
///
/// Returns [`FormatError::InvalidFileName`] describing the first violated
/// rule. More than one underscore, a missing extension, an empty type label,
/// and any character outside the allowed classes are all rejected.
pub fn parse_file_name(path: &str) -> Result<ParsedName, FormatError> {
    let name = base_name(path);
    let reject = |reason: &'static str| FormatError::InvalidFileName {
        name: name.to_string(),
        reason,
    };

    let owner = name
        .get(..6)
        .filter(|prefix| is_owner_id(prefix))
        .ok_or_else(|| reject("missing owner prefix"))?;

    let rest = name
        .get(6..)
        .and_then(|r| r.strip_prefix('_'))
        .ok_or_else(|| reject("missing underscore after owner id"))?;

    let (label, extension) = rest
        .split_once('.')
        .ok_or_else(|| reject("missing extension"))?;

    if label.is_empty() {
        return Err(reject("empty document type"));
    }
    if label.contains('_') {
        return Err(reject("more than one underscore"));
    }
    if !label.chars().all(is_type_char) {
        return Err(reject("document type may contain only letters, spaces, or hyphens"));
    }
    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(reject("extension must be alphanumeric"));
    }

    Ok(ParsedName {
        owner_id: OwnerId::new(owner)?,
        document_type: DocumentType::new(label)?,
        extension: extension.to_string(),
    })
}
