use serde::{Deserialize, Serialize};

use super::CourseCategory;

/// Canonical text and category derived from one course record.
///
/// This is also the metadata shape persisted next to the index and sent as
/// the remote payload, so the field names are part of the on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    text: String,
    category: CourseCategory,
}

impl NormalizedEntry {
    pub fn new(text: impl Into<String>, category: CourseCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> CourseCategory {
        self.category
    }
}
