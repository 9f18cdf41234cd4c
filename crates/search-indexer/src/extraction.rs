//! Document extraction from parsed specs.
//!
//! Each [`Extraction`] variant turns one kind of spec content into documents.
//! The summary variant always runs; the sub-document variants run when the
//! indexer is configured for fragments.

use search_types::{ApiSpec, Document, Field, TsVector, Weight, SPEC_KIND};

use crate::discovery::DiscoveryDocument;
use crate::error::IndexerError;
use crate::format::SpecFormat;
use crate::openapi::{OpenApiV2Document, OpenApiV3Document};
use crate::tree::{Section, SpecTree};

/// A spec document parsed according to its detected format.
#[derive(Debug)]
pub enum ParsedSpec {
    Discovery(DiscoveryDocument),
    OpenApiV2(OpenApiV2Document),
    OpenApiV3(OpenApiV3Document),
}

impl ParsedSpec {
    pub fn parse(format: SpecFormat, contents: &[u8]) -> Result<Self, IndexerError> {
        match format {
            SpecFormat::Discovery => DiscoveryDocument::parse(contents)
                .map(ParsedSpec::Discovery)
                .map_err(|source| IndexerError::Json { format, source }),
            SpecFormat::OpenApiV2 => OpenApiV2Document::parse(contents).map(ParsedSpec::OpenApiV2),
            SpecFormat::OpenApiV3 => OpenApiV3Document::parse(contents).map(ParsedSpec::OpenApiV3),
        }
    }

    pub fn format(&self) -> SpecFormat {
        match self {
            ParsedSpec::Discovery(_) => SpecFormat::Discovery,
            ParsedSpec::OpenApiV2(_) => SpecFormat::OpenApiV2,
            ParsedSpec::OpenApiV3(_) => SpecFormat::OpenApiV3,
        }
    }

    pub fn tree(&self) -> &dyn SpecTree {
        match self {
            ParsedSpec::Discovery(doc) => doc,
            ParsedSpec::OpenApiV2(doc) => doc,
            ParsedSpec::OpenApiV3(doc) => doc,
        }
    }
}

/// A kind of document produced from a spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// One document for the whole spec, keyed by the spec name.
    Summary,
    Methods,
    Schemas,
    Parameters,
}

impl Extraction {
    pub const SUB_DOCUMENTS: [Extraction; 3] =
        [Extraction::Methods, Extraction::Schemas, Extraction::Parameters];

    pub fn weight(&self) -> Weight {
        match self {
            Extraction::Summary => Weight::A,
            Extraction::Methods => Weight::B,
            Extraction::Schemas => Weight::C,
            Extraction::Parameters => Weight::D,
        }
    }

    pub fn field(&self) -> Option<Field> {
        match self {
            Extraction::Summary => None,
            Extraction::Methods => Some(Field::Methods),
            Extraction::Schemas => Some(Field::Schemas),
            Extraction::Parameters => Some(Field::Parameters),
        }
    }

    /// Produce this variant's documents for `spec`.
    pub fn documents(&self, tree: &dyn SpecTree, spec: &ApiSpec, project_id: &str) -> Vec<Document> {
        match self {
            Extraction::Summary => vec![self.document(spec, project_id, "", tree.summary())],
            Extraction::Methods => self.sections(tree.methods(), spec, project_id),
            Extraction::Schemas => self.sections(tree.schemas(), spec, project_id),
            Extraction::Parameters => self.sections(tree.parameters(), spec, project_id),
        }
    }

    fn sections(&self, sections: Vec<Section>, spec: &ApiSpec, project_id: &str) -> Vec<Document> {
        sections
            .into_iter()
            .map(|section| self.document(spec, project_id, &section.path, section.text))
            .collect()
    }

    fn document(&self, spec: &ApiSpec, project_id: &str, fragment: &str, text: String) -> Document {
        let key = if fragment.is_empty() {
            spec.name.clone()
        } else {
            format!("{}#{}", spec.name, fragment)
        };
        Document {
            key,
            name: spec.name.clone(),
            fragment: fragment.to_string(),
            kind: SPEC_KIND.to_string(),
            field: self.field(),
            project_id: project_id.to_string(),
            vector: TsVector::new(text, self.weight()),
            ..Default::default()
        }
        .escaped()
    }
}
