//! Document record stored in the table.

use chrono::{DateTime, Utc};
use std::fmt;

/// Immutable document metadata. The creation time is fixed at construction.
///
/// A document does not carry its own id: the id is the key it is stored
/// under in a `DocumentStore`, so `Display` prints only the metadata. The
/// creation date is printed in RFC 3339 with its UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    title: String,
    author: String,
    file_path: String,
    created_at: DateTime<Utc>,
}

impl Document {
    /// Create a document stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self::with_created_at(title, author, file_path, Utc::now())
    }

    /// Create a document with an explicit creation time.
    pub fn with_created_at(
        title: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            file_path: file_path.into(),
            created_at,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document{{title='{}', author='{}', filePath='{}', creationDate={}}}",
            self.title,
            self.author,
            self.file_path,
            self.created_at.to_rfc3339()
        )
    }
}
