//! Document model for memodb
//!
//! A document is a flat, field-keyed JSON object. Every stored document
//! carries an `id` and a `type` tag; the remaining fields are declared by the
//! schema of the store's type.
//!
//! Dates are RFC 3339 strings in UTC with microsecond precision.

mod pick;

pub use pick::Pick;

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the document identifier
pub const ID_FIELD: &str = "id";
/// Field holding the store type tag
pub const TYPE_FIELD: &str = "type";
/// Field holding the creation time
pub const SINCE_FIELD: &str = "since";
/// Field holding the last successful update time
pub const LASTUPDATE_FIELD: &str = "lastupdate";

/// A schema-typed record keyed by id within a type namespace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a document from a JSON value.
    ///
    /// Returns `None` unless the value is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the id when it is a non-empty string
    pub fn id(&self) -> Option<&str> {
        self.0
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    /// Returns the type tag, if any
    pub fn doc_type(&self) -> Option<&str> {
        self.0.get(TYPE_FIELD).and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a string field
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Set a field, returning the previous value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Builder-style field setter
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Shallow merge: fields of `other` overwrite fields of `self`
    pub fn merge(&mut self, other: &Document) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    /// Keep only the fields accepted by `keep`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.0.retain(|field, _| keep(field));
    }

    /// Iterate over field names
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        document.into_value()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Current time as a document date value
pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}

/// A timestamp strictly newer than `previous`.
///
/// `lastupdate` increases on every update, even when the stored stamp is
/// in the future or the wall clock has not advanced a microsecond.
pub fn timestamp_after(previous: Option<&Value>) -> String {
    let now = Utc::now().trunc_subsecs(6);
    let previous = previous
        .and_then(Value::as_str)
        .and_then(parse_timestamp);

    match previous {
        Some(previous) if previous >= now => {
            format_timestamp(previous + Duration::microseconds(1))
        }
        _ => format_timestamp(now),
    }
}

/// Parse a document date value
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// Microseconds behind the last generated id
static LAST_ID_MICROS: AtomicI64 = AtomicI64::new(0);

/// Timestamp-derived id used when auto-id is enabled.
///
/// Ids strictly increase within the process, so two creates in the same
/// microsecond still get distinct ids. Another process writing the same
/// directory can collide; `create` reports that as `DUPLICATE`.
pub fn generate_id() -> String {
    let now = Utc::now().timestamp_micros();
    let mut last = LAST_ID_MICROS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ID_MICROS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => {
                let date = DateTime::<Utc>::from(UNIX_EPOCH) + Duration::microseconds(next);
                return date.format("%Y%m%d%H%M%S%6f").to_string();
            }
            Err(actual) => last = actual,
        }
    }
}

fn format_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}
