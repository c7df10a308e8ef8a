//! Ordered name → names mappings.
//!
//! Two mappings drive the layout:
//! - the driver mapping, cost variable → driver variables whose
//!   pathway-minus-baseline difference feeds the cost formula;
//! - the category mapping, aggregated category → cost variables summed
//!   into it.
//!
//! Both keep insertion order: rows are laid out in mapping order.

use serde::{Deserialize, Serialize};

/// One key of a [`NamedMapping`] with its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Ordered mapping from a name to zero or more member names.
///
/// Serialized as a list of `{ name, members }` entries so order survives
/// TOML and JSON round trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedMapping {
    entries: Vec<MappingEntry>,
}

/// Cost variable → driver variables.
pub type DriverMapping = NamedMapping;

/// Aggregated category → cost variables.
pub type CategoryMapping = NamedMapping;

impl NamedMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`. A replaced entry keeps its position.
    pub fn insert<I, S>(&mut self, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.members = members,
            None => self.entries.push(MappingEntry { name, members }),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with<I, S>(mut self, name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, members);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.members.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.members.as_slice()))
    }

    /// Every member name, in order of first appearance.
    #[must_use]
    pub fn all_members(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for member in self.entries.iter().flat_map(|e| &e.members) {
            if !seen.contains(&member.as_str()) {
                seen.push(member.as_str());
            }
        }
        seen
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy with `excluded` members removed from every entry.
    ///
    /// Entries stay even when all their members go; the layout turns an empty
    /// category into a constant zero row.
    #[must_use]
    pub fn without_variables<S: AsRef<str>>(&self, excluded: &[S]) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| MappingEntry {
                name: e.name.clone(),
                members: e
                    .members
                    .iter()
                    .filter(|m| !excluded.iter().any(|x| x.as_ref() == m.as_str()))
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { entries }
    }
}

impl<S, I, M> FromIterator<(S, I)> for NamedMapping
where
    S: Into<String>,
    I: IntoIterator<Item = M>,
    M: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, I)>>(iter: T) -> Self {
        let mut mapping = Self::new();
        for (name, members) in iter {
            mapping.insert(name, members);
        }
        mapping
    }
}
