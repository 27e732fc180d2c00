//! Field allow-list projection applied at the read boundary

use super::Document;

/// Optional field allow-list for returned documents.
///
/// An empty pick returns every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pick(Vec<String>);

impl Pick {
    /// Pick every field
    pub fn all() -> Self {
        Self(Vec::new())
    }

    /// Pick only the named fields
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Parse a `|` separated field list, e.g. `content|author`
    pub fn parse(fields: &str) -> Self {
        Self::only(
            fields
                .split('|')
                .map(str::trim)
                .filter(|field| !field.is_empty()),
        )
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Project a document onto the allow-list
    pub fn apply(&self, mut document: Document) -> Document {
        if self.is_all() {
            return document;
        }
        document.retain(|field| self.0.iter().any(|picked| picked == field));
        document
    }
}
