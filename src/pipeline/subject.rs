//! Subject records and grouping results
//!
//! A [`Subject`] is one row of the input table kept as an ordered
//! `column -> value` JSON object. A [`Grouping`] is the ordered list of groups
//! produced by the engine; on the wire it is an object keyed `group_1..group_N`.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Prefix of every group label.
pub const GROUP_LABEL_PREFIX: &str = "group_";

/// One subject (input row), column name to value, in header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(Map<String, Value>);

impl Subject {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Raw value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Value under `column` coerced to a finite number.
    ///
    /// JSON numbers are taken as-is; strings are trimmed and parsed. Anything
    /// else (null, booleans, unparsable text, NaN) yields `None`.
    pub fn numeric(&self, column: &str) -> Option<f64> {
        let value = match self.0.get(column)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        value.is_finite().then_some(value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Subject {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Label for the zero-based group index `index` (`group_1` for 0).
pub fn group_label(index: usize) -> String {
    format!("{}{}", GROUP_LABEL_PREFIX, index + 1)
}

/// Parse a `group_N` label back into a zero-based index.
pub fn parse_group_label(label: &str) -> Option<usize> {
    let n: usize = label.strip_prefix(GROUP_LABEL_PREFIX)?.parse().ok()?;
    n.checked_sub(1)
}

/// An ordered partition of subjects into groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grouping {
    groups: Vec<Vec<Subject>>,
}

impl Grouping {
    pub fn new(groups: Vec<Vec<Subject>>) -> Self {
        Self { groups }
    }

    /// `count` empty groups.
    pub fn empty(count: usize) -> Self {
        Self {
            groups: vec![Vec::new(); count],
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of members in each group, in label order.
    pub fn sizes(&self) -> Vec<usize> {
        self.groups.iter().map(Vec::len).collect()
    }

    /// Total subjects across all groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn label(&self, index: usize) -> String {
        group_label(index)
    }

    pub fn members(&self, index: usize) -> Option<&[Subject]> {
        self.groups.get(index).map(Vec::as_slice)
    }

    pub fn groups(&self) -> &[Vec<Subject>] {
        &self.groups
    }

    /// `(label, members)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &[Subject])> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (group_label(i), g.as_slice()))
    }

    /// Every subject, group by group.
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.groups.iter().flatten()
    }

    pub fn into_groups(self) -> Vec<Vec<Subject>> {
        self.groups
    }
}

impl Serialize for Grouping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (label, members) in self.iter() {
            map.serialize_entry(&label, members)?;
        }
        map.end()
    }
}

struct GroupingVisitor;

impl<'de> Visitor<'de> for GroupingVisitor {
    type Value = Grouping;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object keyed group_1..group_N")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Grouping, A::Error> {
        let mut indexed: Vec<(usize, Vec<Subject>)> = Vec::new();
        while let Some((label, members)) = access.next_entry::<String, Vec<Subject>>()? {
            let index = parse_group_label(&label)
                .ok_or_else(|| de::Error::custom(format!("invalid group label '{}'", label)))?;
            if indexed.iter().any(|(i, _)| *i == index) {
                return Err(de::Error::custom(format!("duplicate group label '{}'", label)));
            }
            indexed.push((index, members));
        }

        indexed.sort_by_key(|(i, _)| *i);
        for (expected, (index, _)) in indexed.iter().enumerate() {
            if *index != expected {
                return Err(de::Error::custom(format!(
                    "missing group label '{}'",
                    group_label(expected)
                )));
            }
        }

        Ok(Grouping::new(indexed.into_iter().map(|(_, g)| g).collect()))
    }
}

impl<'de> Deserialize<'de> for Grouping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(GroupingVisitor)
    }
}
