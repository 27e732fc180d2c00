//! `where` clause evaluation for `find`
//!
//! Each clause is either an exact value, compared with JSON equality and no
//! coercion, or a caller predicate over the field value. A field the
//! document lacks is presented to the clause as `null`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{Document, ID_FIELD, TYPE_FIELD};
use crate::schema::DocumentSchema;

/// Caller-supplied field test
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum Clause {
    Exact(Value),
    Predicate(PredicateFn),
}

impl Clause {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Clause::Exact(expected) => value == expected,
            Clause::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Clause::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// How clauses combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Logic::And),
            "OR" => Ok(Logic::Or),
            other => Err(format!("unknown logic '{}', expected AND or OR", other)),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::And => f.write_str("AND"),
            Logic::Or => f.write_str("OR"),
        }
    }
}

/// Field name → clause, in insertion order
#[derive(Debug, Clone, Default)]
pub struct Where {
    clauses: Vec<(String, Clause)>,
}

impl Where {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause. A second clause on the same field replaces the first.
    pub fn field(mut self, name: impl Into<String>, clause: Clause) -> Self {
        let name = name.into();
        self.clauses.retain(|(existing, _)| *existing != name);
        self.clauses.push((name, clause));
        self
    }

    pub fn eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(name, Clause::Exact(value.into()))
    }

    pub fn matching<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.field(name, Clause::Predicate(Arc::new(predicate)))
    }

    /// Build exact clauses from a JSON object
    pub fn from_object(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(
            map.iter()
                .fold(Self::new(), |query, (name, value)| query.eq(name.clone(), value.clone())),
        )
    }

    /// Drop clauses on fields the schema does not declare
    pub fn retain_declared(&mut self, schema: &DocumentSchema) {
        self.clauses.retain(|(name, _)| {
            name == ID_FIELD || name == TYPE_FIELD || schema.contains(name)
        });
    }

    pub fn clauses(&self) -> impl Iterator<Item = (&str, &Clause)> {
        self.clauses.iter().map(|(name, clause)| (name.as_str(), clause))
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Evaluates `where` clauses against documents
pub struct QueryEvaluator;

impl QueryEvaluator {
    /// An empty clause set matches every document under either logic.
    pub fn matches(query: &Where, logic: Logic, document: &Document) -> bool {
        if query.is_empty() {
            return true;
        }

        let mut results = query
            .clauses()
            .map(|(name, clause)| clause.matches(document.get(name).unwrap_or(&Value::Null)));

        match logic {
            Logic::And => results.all(|matched| matched),
            Logic::Or => results.any(|matched| matched),
        }
    }
}
