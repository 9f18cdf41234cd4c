//! Common view over parsed spec documents.

use serde::{Deserialize, Deserializer};

/// One addressable part of a spec: an operation, a schema or a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Fragment path under the spec, e.g. `methods/listPets`.
    pub path: String,
    pub text: String,
}

impl Section {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Text extraction implemented by each parsed spec format.
pub trait SpecTree {
    /// Headline text indexed for the whole spec.
    fn summary(&self) -> String;

    fn methods(&self) -> Vec<Section>;

    fn schemas(&self) -> Vec<Section>;

    fn parameters(&self) -> Vec<Section>;
}

/// Join the non-empty lines of a section's text.
pub(crate) fn lines<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accept any YAML/JSON scalar where a string is expected.
///
/// Version fields are often written unquoted (`version: 1.0`), which YAML
/// reads as a number.
pub(crate) fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| match s {
        Scalar::Text(s) => s,
        Scalar::Int(i) => i.to_string(),
        // `{:?}` keeps the decimal point of whole numbers: 1.0 stays "1.0".
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::Bool(b) => b.to_string(),
    }))
}
