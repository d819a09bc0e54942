#![forbid(unsafe_code)]

//! Hierarchical element addressing.
//!
//! An [`ElementPath`] names one element instance in the document tree. The
//! path is split into *parts*: every time the tree crosses into a nested
//! scene or component instance a new part begins. Each part is a non-empty
//! list of UIDs.
//!
//! The string form joins UIDs with `/` and parts with `:`, so
//! `storyboard/scene:root/child` has two parts.
//!
//! # Invariants
//!
//! 1. Every part is non-empty (the empty path has zero parts).
//! 2. Equality, ordering and hashing are structural.
//! 3. `path.parent_path()` is a strict prefix of `path` unless `path` is empty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const UID_SEPARATOR: char = '/';
const PART_SEPARATOR: char = ':';

/// Structural address of one element instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ElementPath {
    parts: Vec<Vec<String>>,
}

impl ElementPath {
    /// The empty path (the document root, above every scene).
    #[must_use]
    pub const fn empty() -> Self {
        Self { parts: Vec::new() }
    }

    /// Build a path from explicit parts; empty parts are dropped.
    #[must_use]
    pub fn from_parts<I, P, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts = parts
            .into_iter()
            .map(|part| part.into_iter().map(Into::into).collect::<Vec<String>>())
            .filter(|part| !part.is_empty())
            .collect();
        Self { parts }
    }

    #[must_use]
    pub fn parts(&self) -> &[Vec<String>] {
        &self.parts
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of UIDs across all parts.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// UID of the addressed element.
    #[must_use]
    pub fn last_uid(&self) -> Option<&str> {
        self.parts
            .last()
            .and_then(|part| part.last())
            .map(String::as_str)
    }

    /// Drop the last UID. A single-UID trailing part is dropped whole.
    #[must_use]
    pub fn parent_path(&self) -> ElementPath {
        let mut parts = self.parts.clone();
        if let Some(last) = parts.last_mut() {
            last.pop();
            if last.is_empty() {
                parts.pop();
            }
        }
        Self { parts }
    }

    /// Child in the same scene part.
    #[must_use]
    pub fn append(&self, uid: impl Into<String>) -> ElementPath {
        let mut parts = self.parts.clone();
        match parts.last_mut() {
            Some(last) => last.push(uid.into()),
            None => parts.push(vec![uid.into()]),
        }
        Self { parts }
    }

    /// Child across a new scene boundary.
    #[must_use]
    pub fn append_part(&self, uid: impl Into<String>) -> ElementPath {
        let mut parts = self.parts.clone();
        parts.push(vec![uid.into()]);
        Self { parts }
    }

    /// Every ancestor, outermost first, ending with `self`.
    #[must_use]
    pub fn all_paths(&self) -> Vec<ElementPath> {
        let mut result = Vec::with_capacity(self.depth());
        let mut current = self.clone();
        while !current.is_empty() {
            let parent = current.parent_path();
            result.push(current);
            current = parent;
        }
        result.reverse();
        result
    }

    /// `self` is a strict descendant of `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &ElementPath) -> bool {
        let Some((ancestor_last, ancestor_full)) = ancestor.parts.split_last() else {
            return !self.is_empty();
        };
        if self.depth() <= ancestor.depth() || self.parts.len() < ancestor.parts.len() {
            return false;
        }
        let shared = ancestor_full.len();
        self.parts[..shared] == *ancestor_full && self.parts[shared].starts_with(ancestor_last)
    }

    /// `self` is a strict ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor_of(&self, descendant: &ElementPath) -> bool {
        descendant.is_descendant_of(self)
    }

    #[must_use]
    pub fn is_child_of(&self, parent: &ElementPath) -> bool {
        !self.is_empty() && self.parent_path() == *parent
    }

    /// Distinct paths sharing a parent.
    #[must_use]
    pub fn is_sibling_of(&self, other: &ElementPath) -> bool {
        self != other
            && !self.is_empty()
            && !other.is_empty()
            && self.parent_path() == other.parent_path()
    }
}

/// Order-preserving dedup of a path list.
#[must_use]
pub fn unique_element_paths<'a, I>(paths: I) -> Vec<ElementPath>
where
    I: IntoIterator<Item = &'a ElementPath>,
{
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for path in paths {
        if seen.insert(path) {
            unique.push(path.clone());
        }
    }
    unique
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, part) in self.parts.iter().enumerate() {
            if index > 0 {
                write!(f, "{PART_SEPARATOR}")?;
            }
            for (uid_index, uid) in part.iter().enumerate() {
                if uid_index > 0 {
                    write!(f, "{UID_SEPARATOR}")?;
                }
                f.write_str(uid)?;
            }
        }
        Ok(())
    }
}

/// Failure to parse the string form of an [`ElementPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementPathParseError {
    EmptyUid { position: usize },
    InvalidCharacter { uid: String },
}

impl fmt::Display for ElementPathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUid { position } => {
                write!(f, "element path contains an empty uid at position {position}")
            }
            Self::InvalidCharacter { uid } => {
                write!(f, "element path uid {uid:?} contains whitespace")
            }
        }
    }
}

impl std::error::Error for ElementPathParseError {}

impl FromStr for ElementPath {
    type Err = ElementPathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Ok(Self::empty());
        }
        let mut parts = Vec::new();
        let mut position = 0;
        for raw_part in input.split(PART_SEPARATOR) {
            let mut part = Vec::new();
            for uid in raw_part.split(UID_SEPARATOR) {
                if uid.is_empty() {
                    return Err(ElementPathParseError::EmptyUid { position });
                }
                if uid.chars().any(char::is_whitespace) {
                    return Err(ElementPathParseError::InvalidCharacter {
                        uid: uid.to_owned(),
                    });
                }
                part.push(uid.to_owned());
                position += 1;
            }
            parts.push(part);
        }
        Ok(Self { parts })
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
