//! The file contract and the in-memory e-book variant.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use booklink_core::Clock;

/// What the register needs to know about a stored file.
///
/// The register never looks at the content; it only budgets bytes and
/// checks age.
pub trait RegisteredFile: Send + Sync {
    /// Creation time (Unix ms).
    fn created_at(&self) -> i64;

    /// Size counted against the register's byte cap.
    fn size_bytes(&self) -> u64;
}

/// Descriptive fields attached by an external enrichment step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbookMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// An uploaded e-book held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryEbookFile {
    /// Sanitized file name used for the download.
    pub name: String,
    data: Bytes,
    created_at: i64,
    metadata: Option<EbookMetadata>,
}

impl InMemoryEbookFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>, created_at: i64) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            created_at,
            metadata: None,
        }
    }

    /// Create a file stamped with the current time of `clock`.
    pub fn make(name: impl Into<String>, data: impl Into<Bytes>, clock: &dyn Clock) -> Self {
        Self::new(name, data, clock.now_millis())
    }

    /// Attach enrichment metadata.
    pub fn with_metadata(mut self, metadata: EbookMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// File content. Cloning the returned `Bytes` does not copy.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn metadata(&self) -> Option<&EbookMetadata> {
        self.metadata.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.as_ref()?.title.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.metadata.as_ref()?.author.as_deref()
    }
}

impl RegisteredFile for InMemoryEbookFile {
    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}
