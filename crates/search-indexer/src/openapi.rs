//! OpenAPI v2 (Swagger) and v3 documents.
//!
//! Only the parts that carry searchable text are modelled. Contents may be
//! YAML or JSON.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::IndexerError;
use crate::format::SpecFormat;
use crate::tree::{lines, scalar_string, Section, SpecTree};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Info {
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
}

impl PathItem {
    fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("GET", &self.get),
            ("PUT", &self.put),
            ("POST", &self.post),
            ("DELETE", &self.delete),
            ("OPTIONS", &self.options),
            ("HEAD", &self.head),
            ("PATCH", &self.patch),
            ("TRACE", &self.trace),
        ]
        .into_iter()
        .filter_map(|(verb, op)| op.as_ref().map(|op| (verb, op)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: Option<String>,
    #[serde(rename = "in")]
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Swagger 2.0 document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenApiV2Document {
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    pub definitions: BTreeMap<String, Schema>,
    pub parameters: BTreeMap<String, Parameter>,
}

/// OpenAPI 3.x document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OpenApiV3Document {
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    pub components: Components,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
    pub parameters: BTreeMap<String, Parameter>,
}

impl OpenApiV2Document {
    pub fn parse(contents: &[u8]) -> Result<Self, IndexerError> {
        parse(SpecFormat::OpenApiV2, contents)
    }
}

impl OpenApiV3Document {
    pub fn parse(contents: &[u8]) -> Result<Self, IndexerError> {
        parse(SpecFormat::OpenApiV3, contents)
    }
}

fn parse<T: DeserializeOwned>(format: SpecFormat, contents: &[u8]) -> Result<T, IndexerError> {
    let is_json = contents
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{');
    if is_json {
        serde_json::from_slice(contents).map_err(|source| IndexerError::Json { format, source })
    } else {
        serde_yml::from_slice(contents).map_err(|source| IndexerError::Yaml { format, source })
    }
}

fn summary(info: &Info) -> String {
    lines([
        info.title.as_deref().unwrap_or_default(),
        info.version.as_deref().unwrap_or_default(),
        info.description.as_deref().unwrap_or_default(),
    ])
}

fn operation_sections(paths: &BTreeMap<String, PathItem>) -> Vec<Section> {
    let mut sections = Vec::new();
    for (path, item) in paths {
        for (verb, op) in item.operations() {
            let route = format!("{} {}", verb, path);
            let id = op.operation_id.clone().unwrap_or_else(|| route.clone());
            sections.push(Section::new(
                format!("methods/{}", id),
                lines([
                    id.as_str(),
                    route.as_str(),
                    op.summary.as_deref().unwrap_or_default(),
                    op.description.as_deref().unwrap_or_default(),
                ]),
            ));
        }
    }
    sections
}

fn schema_sections(schemas: &BTreeMap<String, Schema>) -> Vec<Section> {
    schemas
        .iter()
        .map(|(name, schema)| {
            Section::new(
                format!("schemas/{}", name),
                lines([
                    name.as_str(),
                    schema.title.as_deref().unwrap_or_default(),
                    schema.description.as_deref().unwrap_or_default(),
                ]),
            )
        })
        .collect()
}

fn parameter_sections(parameters: &BTreeMap<String, Parameter>) -> Vec<Section> {
    parameters
        .iter()
        .map(|(key, parameter)| {
            Section::new(
                format!("parameters/{}", key),
                lines([
                    parameter.name.as_deref().unwrap_or(key),
                    parameter.location.as_deref().unwrap_or_default(),
                    parameter.description.as_deref().unwrap_or_default(),
                ]),
            )
        })
        .collect()
}

impl SpecTree for OpenApiV2Document {
    fn summary(&self) -> String {
        summary(&self.info)
    }

    fn methods(&self) -> Vec<Section> {
        operation_sections(&self.paths)
    }

    fn schemas(&self) -> Vec<Section> {
        schema_sections(&self.definitions)
    }

    fn parameters(&self) -> Vec<Section> {
        parameter_sections(&self.parameters)
    }
}

impl SpecTree for OpenApiV3Document {
    fn summary(&self) -> String {
        summary(&self.info)
    }

    fn methods(&self) -> Vec<Section> {
        operation_sections(&self.paths)
    }

    fn schemas(&self) -> Vec<Section> {
        schema_sections(&self.components.schemas)
    }

    fn parameters(&self) -> Vec<Section> {
        parameter_sections(&self.components.parameters)
    }
}
