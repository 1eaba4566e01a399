//! Shared document threaded through the pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix shared by every embedded generation error
const SENTINEL_PREFIX: &str = "Error in ";

/// Named fields of the document, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentField {
    Requirements,
    Design,
    Code,
    Review,
    Tests,
    Deploy,
}

impl DocumentField {
    /// All fields in the order the stages populate them
    pub const ALL: [DocumentField; 6] = [
        DocumentField::Requirements,
        DocumentField::Design,
        DocumentField::Code,
        DocumentField::Review,
        DocumentField::Tests,
        DocumentField::Deploy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentField::Requirements => "requirements",
            DocumentField::Design => "design",
            DocumentField::Code => "code",
            DocumentField::Review => "review",
            DocumentField::Tests => "tests",
            DocumentField::Deploy => "deploy",
        }
    }

    /// Whether the field holds source code rather than prose
    pub fn is_code(&self) -> bool {
        matches!(self, DocumentField::Code | DocumentField::Tests)
    }
}

impl fmt::Display for DocumentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown document field: {}", s))
    }
}

/// Output of a single stage
///
/// A degraded deliverable is a generation failure that was folded into the
/// document instead of aborting the run. Its `text` is the sentinel string
/// downstream stages will read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deliverable {
    Success(String),
    Degraded { text: String, cause: String },
}

impl Deliverable {
    /// Build the degraded deliverable for a failed generation of `field`
    pub fn degraded(field: DocumentField, cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Deliverable::Degraded {
            text: sentinel(field, &cause),
            cause,
        }
    }

    /// The stored text, which is the sentinel for degraded outputs
    pub fn text(&self) -> &str {
        match self {
            Deliverable::Success(text) => text,
            Deliverable::Degraded { text, .. } => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Deliverable::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Deliverable::Success(_) => None,
            Deliverable::Degraded { cause, .. } => Some(cause),
        }
    }
}

/// Format the embedded error string for a failed generation
pub fn sentinel(field: DocumentField, cause: &str) -> String {
    format!("{}{} generation: {}", SENTINEL_PREFIX, field, cause)
}

/// Check whether a stored value is an embedded generation error
///
/// Only needed for consumers that see raw text; `Deliverable` carries the tag.
pub fn is_sentinel(field: DocumentField, text: &str) -> bool {
    text.starts_with(&format!("{}{} generation: ", SENTINEL_PREFIX, field))
}

/// Single-field update returned by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub field: DocumentField,
    pub deliverable: Deliverable,
}

/// The document under construction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    deliverables: BTreeMap<DocumentField, Deliverable>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text of a field, empty when unset
    pub fn get(&self, field: DocumentField) -> &str {
        self.deliverables
            .get(&field)
            .map(Deliverable::text)
            .unwrap_or("")
    }

    pub fn deliverable(&self, field: DocumentField) -> Option<&Deliverable> {
        self.deliverables.get(&field)
    }

    pub fn is_set(&self, field: DocumentField) -> bool {
        self.deliverables.contains_key(&field)
    }

    /// Fold a patch into the document (field-level overwrite)
    pub fn apply(&mut self, patch: Patch) {
        self.deliverables.insert(patch.field, patch.deliverable);
    }

    /// Populated fields in pipeline order
    pub fn populated_fields(&self) -> Vec<DocumentField> {
        self.deliverables.keys().copied().collect()
    }

    /// Fields whose deliverable is an embedded error
    pub fn degraded_fields(&self) -> Vec<DocumentField> {
        self.deliverables
            .iter()
            .filter(|(_, d)| d.is_degraded())
            .map(|(field, _)| *field)
            .collect()
    }

    pub fn clear(&mut self) {
        self.deliverables.clear();
    }

    /// Read-only view restricted to `fields`
    pub fn view(&self, fields: &[DocumentField]) -> DocumentView<'_> {
        let values = fields
            .iter()
            .map(|field| (*field, self.get(*field)))
            .collect();
        DocumentView { values }
    }
}

/// Read-only projection of the document onto a stage's declared inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView<'a> {
    values: BTreeMap<DocumentField, &'a str>,
}

impl<'a> DocumentView<'a> {
    /// Value of a declared input; undeclared fields read as empty
    pub fn get(&self, field: DocumentField) -> &'a str {
        self.values.get(&field).copied().unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = DocumentField> + '_ {
        self.values.keys().copied()
    }
}
