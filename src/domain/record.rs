/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The flat `(class, id, key, value)` record model shared by every detector

use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;
use std::fmt;

/// Value carried by a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Borrow the value as a string slice when it is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used for lookups across types (`4` and `"4"` both give `4`)
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Str(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    /// Single-quoted literal form used by the human readable output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) if v.fract() == 0.0 && v.is_finite() => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{}", quote(s)),
        }
    }
}

/// Quote a string the way the human readable output expects
pub fn quote(s: &str) -> String {
    if s.contains('\'') && !s.contains('"') {
        format!("\"{s}\"")
    } else {
        format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// A single `(class, id, key, value)` tuple
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub class: String,
    pub id: String,
    pub key: String,
    pub value: Value,
}

impl Record {
    pub fn new(
        class: impl Into<String>,
        id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether the record sits at the given coordinates
    pub fn is(&self, class: &str, id: &str, key: &str) -> bool {
        self.class == class && self.id == id && self.key == key
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(4)?;
        tuple.serialize_element(&self.class)?;
        tuple.serialize_element(&self.id)?;
        tuple.serialize_element(&self.key)?;
        tuple.serialize_element(&self.value)?;
        tuple.end()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            quote(&self.class),
            quote(&self.id),
            quote(&self.key),
            self.value
        )
    }
}

/// Append-only, order preserving collection of records
///
/// Uniqueness of `(class, id, key)` is not enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        class: impl Into<String>,
        id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.records.push(Record::new(class, id, key, value));
    }

    pub fn push_record(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    pub fn append(&mut self, other: RecordSet) {
        self.records.extend(other.records);
    }

    /// First value stored at the given coordinates
    pub fn get(&self, class: &str, id: &str, key: &str) -> Option<&Value> {
        self.records
            .iter()
            .find(|r| r.is(class, id, key))
            .map(|r| &r.value)
    }

    /// First value at the given coordinates rendered as text, empty when absent
    pub fn get_value(&self, class: &str, id: &str, key: &str) -> String {
        self.get(class, id, key)
            .and_then(Value::to_text)
            .unwrap_or_default()
    }

    /// Remove the first record at the given coordinates and return it
    pub fn remove_first(&mut self, class: &str, id: &str, key: &str) -> Option<Record> {
        let pos = self.records.iter().position(|r| r.is(class, id, key))?;
        Some(self.records.remove(pos))
    }

    /// Records of one class, in insertion order
    pub fn by_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records.iter().filter(move |r| r.class == class)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop class-less records and strip control characters from strings
    pub fn clean(self) -> Self {
        let records = self
            .records
            .into_iter()
            .filter(|r| !r.class.is_empty())
            .map(|r| Record {
                class: strip_control(&r.class),
                id: strip_control(&r.id),
                key: strip_control(&r.key),
                value: match r.value {
                    Value::Str(s) => Value::Str(strip_control(&s)),
                    other => other,
                },
            })
            .collect();
        Self { records }
    }
}

fn strip_control(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect()
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Extend<Record> for RecordSet {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, iter: I) {
        self.records.extend(iter);
    }
}
