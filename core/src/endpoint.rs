//! Endpoint registry: logical endpoint names to URL paths.
//!
//! # Design
//! Each vendor client registers its endpoints once, at construction, as
//! either a literal path or a path template plus the placeholder tokens it
//! requires. Resolution looks the name up, checks that every required
//! placeholder was supplied with a truthy value, and substitutes the values
//! into the template. The registry is never mutated by resolution.
//!
//! Placeholder tokens are matched literally (`<course_id>`, `{id}`, whatever
//! the vendor chose), not parsed. Substitution is plain string replacement,
//! applied in the order the placeholders are listed. If one placeholder is a
//! substring of another (`<id>` and `<item_id>` are fine, `id` and `item_id`
//! are not) replacing the shorter one first corrupts the longer one. Vendors
//! pick delimited tokens to stay clear of this.
//!
//! Serialized form mirrors how the endpoint tables are usually written down:
//! a bare string for a literal path, a `[template, [placeholders...]]` pair
//! for a template.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Substitution values for path placeholders, keyed by placeholder token.
pub type PathParams = serde_json::Map<String, Value>;

/// Build `PathParams` from `(token, value)` pairs.
pub fn path_params<I, K, V>(pairs: I) -> PathParams
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// How a logical endpoint maps onto a URL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointSpec {
    /// Used verbatim.
    Literal(String),
    /// Path template and the placeholder tokens it requires.
    Templated(String, Vec<String>),
}

impl EndpointSpec {
    pub fn literal(path: impl Into<String>) -> Self {
        EndpointSpec::Literal(path.into())
    }

    pub fn templated<I, S>(template: impl Into<String>, placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EndpointSpec::Templated(
            template.into(),
            placeholders.into_iter().map(Into::into).collect(),
        )
    }

    /// Every listed placeholder occurs in the template.
    pub fn is_well_formed(&self) -> bool {
        match self {
            EndpointSpec::Literal(_) => true,
            EndpointSpec::Templated(template, placeholders) => placeholders
                .iter()
                .all(|p| !p.is_empty() && template.contains(p.as_str())),
        }
    }
}

/// Read-only table of named endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointRegistry {
    entries: HashMap<String, EndpointSpec>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.insert(name, EndpointSpec::literal(path))
    }

    pub fn templated<I, S>(
        self,
        name: impl Into<String>,
        template: impl Into<String>,
        placeholders: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, EndpointSpec::templated(template, placeholders))
    }

    /// Register `spec` under `name`, replacing any earlier entry.
    pub fn insert(mut self, name: impl Into<String>, spec: EndpointSpec) -> Self {
        self.entries.insert(name.into(), spec);
        self
    }

    /// Layer `other` on top of this registry; its entries win on conflicts.
    pub fn extend(mut self, other: EndpointRegistry) -> Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EndpointSpec> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `name` into `base_url` followed by the (substituted) path.
    pub fn resolve(&self, base_url: &str, name: &str, params: &PathParams) -> Result<String> {
        let spec = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UndefinedEndpoint(name.to_string()))?;

        match spec {
            EndpointSpec::Literal(path) => Ok(format!("{base_url}{path}")),
            EndpointSpec::Templated(..) if !spec.is_well_formed() => {
                Err(Error::UndefinedEndpoint(name.to_string()))
            }
            EndpointSpec::Templated(template, placeholders) => {
                let mut path = template.clone();
                for placeholder in placeholders {
                    let value = params
                        .get(placeholder)
                        .filter(|v| !is_falsy(v))
                        .ok_or_else(|| Error::MissingElement(placeholder.clone()))?;
                    path = path.replace(placeholder.as_str(), &render(value));
                }
                Ok(format!("{base_url}{path}"))
            }
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// String form of a substitution value; strings are not quoted.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
