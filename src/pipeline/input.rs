//! Input: build a [`DocumentRequest`] from text or a Markdown file.
//!
//! Source text is normalised once here so every later stage can assume it:
//! no byte-order mark, `\n` line endings only, exactly one trailing newline.

use crate::error::Md2PdfError;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// One document to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentRequest {
    /// Normalised Markdown source.
    pub source: String,
    /// Shown on the cover page and in the page header. May be empty.
    pub title: String,
    /// Shown under the title on the cover page.
    pub description: Option<String>,
}

impl DocumentRequest {
    /// A request for `source` with no title or description.
    pub fn new(source: impl AsRef<str>) -> Self {
        Self {
            source: normalise_source(source.as_ref()),
            title: String::new(),
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Empty descriptions are stored as `None`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.is_empty()).then_some(description);
        self
    }

    /// Description text, empty when unset.
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Read a UTF-8 Markdown file.
    ///
    /// # Errors
    /// [`Md2PdfError::FileNotFound`], [`Md2PdfError::PermissionDenied`],
    /// [`Md2PdfError::InvalidEncoding`] or [`Md2PdfError::InputReadFailed`].
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, Md2PdfError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => Md2PdfError::FileNotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Md2PdfError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let text = String::from_utf8(bytes).map_err(|_| Md2PdfError::InvalidEncoding {
            path: path.to_path_buf(),
        })?;

        debug!(
            "Read {} bytes of Markdown from {}",
            text.len(),
            path.display()
        );
        Ok(Self::new(text))
    }
}

/// Strip a leading BOM, convert CRLF/CR to LF and end with one newline.
pub fn normalise_source(input: &str) -> String {
    let s = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut s = s.replace("\r\n", "\n").replace('\r', "\n");
    let trimmed = s.trim_end_matches('\n').len();
    s.truncate(trimmed);
    if !s.is_empty() {
        s.push('\n');
    }
    s
}
