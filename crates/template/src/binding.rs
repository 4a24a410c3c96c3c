use crate::error::TemplateError;
use serde_json::{Map, Value};
use std::fmt;
use std::io::Read;
use textpdf_style::DocumentConfig;

/// Why a placeholder lookup produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMiss {
    /// The JSON document has no `data` object.
    NoDataObject,
    Missing,
    /// The key exists but its value is not a JSON string.
    NotString,
}

impl fmt::Display for LookupMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LookupMiss::NoDataObject => "data has no 'data' object",
            LookupMiss::Missing => "no such key in 'data'",
            LookupMiss::NotString => "value is not a string",
        })
    }
}

/// The JSON document a template is filled from, parsed once.
///
/// Placeholder ids resolve against the top-level `data` object; a few other
/// top-level keys carry document metadata.
#[derive(Debug, Clone, Default)]
pub struct DataBinding {
    root: Map<String, Value>,
}

impl DataBinding {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, TemplateError> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, TemplateError> {
        Self::from_value(serde_json::from_str(source)?)
    }

    /// Fails unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        match value {
            Value::Object(root) => {
                match root.get("data") {
                    Some(Value::Object(_)) => {}
                    Some(_) => log::warn!("'data' is not an object; every placeholder will be empty"),
                    None => log::warn!("no 'data' object; every placeholder will be empty"),
                }
                Ok(Self { root })
            }
            other => Err(TemplateError::Data(format!(
                "top level must be a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Resolves a placeholder id against the `data` object.
    pub fn lookup(&self, id: &str) -> Result<&str, LookupMiss> {
        let data = match self.root.get("data") {
            Some(Value::Object(data)) => data,
            _ => return Err(LookupMiss::NoDataObject),
        };
        match data.get(id) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(LookupMiss::NotString),
            None => Err(LookupMiss::Missing),
        }
    }

    /// A top-level string such as `title` or `author`.
    pub fn root_string(&self, key: &str) -> Option<&str> {
        self.root.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.root_string("title")
    }

    /// Copies document metadata into `config` where the caller has not set it.
    pub fn apply_metadata(&self, config: &mut DocumentConfig) {
        let fill = |slot: &mut Option<String>, key: &str| {
            if slot.is_none() {
                *slot = self.root_string(key).map(str::to_string);
            }
        };
        fill(&mut config.title, "title");
        fill(&mut config.author, "author");
        fill(&mut config.description, "description");
        fill(&mut config.keywords, "keywords");
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
