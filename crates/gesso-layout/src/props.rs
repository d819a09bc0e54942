#![forbid(unsafe_code)]

//! Authored element properties.
//!
//! A [`PropertyBag`] holds the attributes an element was written with, keyed
//! by a dotted [`PropertyPath`] such as `style.left`. A value is either a
//! literal or an opaque expression the tool cannot evaluate; a missing key
//! means the author never wrote the property.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Dotted path to one property, e.g. `style.gridColumnStart`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath {
    elements: Vec<String>,
}

impl PropertyPath {
    #[must_use]
    pub fn new<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    /// `style.<name>`.
    #[must_use]
    pub fn style(name: &str) -> Self {
        Self::new(["style", name])
    }

    #[must_use]
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// Last element of the path.
    #[must_use]
    pub fn leaf(&self) -> Option<&str> {
        self.elements.last().map(String::as_str)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.elements.join("."))
    }
}

/// Empty property path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPathParseError {
    pub input: String,
}

impl fmt::Display for PropertyPathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property path {:?} has an empty segment", self.input)
    }
}

impl std::error::Error for PropertyPathParseError {}

impl FromStr for PropertyPath {
    type Err = PropertyPathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.split('.').any(str::is_empty) {
            return Err(PropertyPathParseError {
                input: input.to_owned(),
            });
        }
        Ok(Self::new(input.split('.')))
    }
}

impl Serialize for PropertyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PropertyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One authored attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Bool(bool),
    String(String),
    /// Source the tool does not evaluate (e.g. `{ offset * 2 }`).
    Expression { expression: String },
}

impl AttributeValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Literal values can be rewritten safely; expressions cannot.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        !matches!(self, Self::Expression { .. })
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Authored attributes of one element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    values: BTreeMap<PropertyPath, AttributeValue>,
}

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, path: PropertyPath, value: impl Into<AttributeValue>) -> Self {
        self.values.insert(path, value.into());
        self
    }

    /// Builder-style insert of a `style.*` property.
    #[must_use]
    pub fn with_style(self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.with(PropertyPath::style(name), value)
    }

    pub fn set(&mut self, path: PropertyPath, value: AttributeValue) {
        self.values.insert(path, value);
    }

    /// Remove a property; returns whether it was present.
    pub fn remove(&mut self, path: &PropertyPath) -> bool {
        self.values.remove(path).is_some()
    }

    #[must_use]
    pub fn get(&self, path: &PropertyPath) -> Option<&AttributeValue> {
        self.values.get(path)
    }

    #[must_use]
    pub fn get_style(&self, name: &str) -> Option<&AttributeValue> {
        self.get(&PropertyPath::style(name))
    }

    #[must_use]
    pub fn style_number(&self, name: &str) -> Option<f64> {
        self.get_style(name).and_then(AttributeValue::as_number)
    }

    #[must_use]
    pub fn has_style(&self, name: &str) -> bool {
        self.get_style(name).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyPath, &AttributeValue)> {
        self.values.iter()
    }
}
