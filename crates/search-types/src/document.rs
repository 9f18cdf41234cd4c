//! Indexed document model.
//!
//! A document is one searchable record derived from a specification resource,
//! or from a fragment of one (an operation, a schema, a parameter). Its text is
//! stored twice: as a weighted full-text vector that the backend builds at write
//! time, and as raw text that search results are excerpted from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Storage entity name for documents.
pub const DOCUMENT_ENTITY: &str = "Document";

/// Kind tag for documents produced from API specs.
pub const SPEC_KIND: &str = "Spec";

/// Sub-classification of the part of a resource a document represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    DisplayName,
    Description,
    Parameters,
    Methods,
    Schemas,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::DisplayName => "displayname",
            Field::Description => "description",
            Field::Parameters => "parameters",
            Field::Methods => "methods",
            Field::Schemas => "schemas",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "displayname" => Ok(Field::DisplayName),
            "description" => Ok(Field::Description),
            "parameters" => Ok(Field::Parameters),
            "methods" => Ok(Field::Methods),
            "schemas" => Ok(Field::Schemas),
            other => Err(SearchError::InvalidValue(format!("unknown field: {}", other))),
        }
    }
}

/// Relevance rank applied to a document's text. `A` ranks highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Weight {
    A,
    B,
    C,
    #[default]
    D,
}

impl Weight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weight::A => "A",
            Weight::B => "B",
            Weight::C => "C",
            Weight::D => "D",
        }
    }

    /// Multiplier PostgreSQL's `ts_rank` applies to lexemes of this weight
    /// (default weight array `{0.1, 0.2, 0.4, 1.0}`).
    pub fn rank_factor(&self) -> f64 {
        match self {
            Weight::A => 1.0,
            Weight::B => 0.4,
            Weight::C => 0.2,
            Weight::D => 0.1,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weight {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Weight::A),
            "B" => Ok(Weight::B),
            "C" => Ok(Weight::C),
            "D" | "" => Ok(Weight::D),
            other => Err(SearchError::InvalidValue(format!("unknown weight: {}", other))),
        }
    }
}

/// Write-only full-text vector: the text to index and its weight.
///
/// The backend converts this into its own indexable structure when the
/// document is written. It is never populated from a read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TsVector {
    pub raw_text: String,
    pub weight: Weight,
}

impl TsVector {
    pub fn new(raw_text: impl Into<String>, weight: Weight) -> Self {
        Self {
            raw_text: raw_text.into(),
            weight,
        }
    }
}

/// A searchable record stored in the index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Primary identity: resource name, plus `#fragment` for sub-documents.
    pub key: String,
    /// Fully-qualified name of the owning resource.
    pub name: String,
    /// Path to the part of the resource this document covers, possibly empty.
    pub fragment: String,
    /// Resource type, e.g. "Spec".
    pub kind: String,
    /// Fragment type, when the document covers part of a resource.
    pub field: Option<Field>,
    /// Project the owning resource belongs to.
    pub project_id: String,
    pub vector: TsVector,
    /// Text that excerpts are highlighted from.
    pub raw: String,
    /// Set once the vector text has been HTML-escaped into `raw`.
    pub escaped: bool,
}

impl Document {
    /// HTML-escape the vector text and copy it to `raw`.
    ///
    /// Calling this more than once leaves the document unchanged.
    pub fn escape(&mut self) -> &mut Self {
        if self.escaped {
            return self;
        }
        self.vector.raw_text = escape_html(&self.vector.raw_text);
        self.raw = self.vector.raw_text.clone();
        self.escaped = true;
        self
    }

    /// Builder-style variant of [`Document::escape`].
    pub fn escaped(mut self) -> Self {
        self.escape();
        self
    }

    /// True when there is no text to index, meaning any stored row for this
    /// key should be deleted rather than overwritten.
    pub fn is_empty(&self) -> bool {
        self.vector.raw_text.is_empty()
    }

    /// The stored spelling of `field` (empty when unset).
    pub fn field_str(&self) -> &'static str {
        self.field.as_ref().map(Field::as_str).unwrap_or("")
    }
}

/// Escape the five characters that are special in HTML text and attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            c => out.push(c),
        }
    }
    out
}
