//! Query strings for RAPI requests.
//!
//! RAPI reads boolean query flags as `0`/`1` rather than `true`/`false`.

use std::fmt::Display;

/// Ordered list of query parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams(Vec<(&'static str, String)>);

impl QueryParams {
    /// Empty parameter list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a boolean flag, encoded as `0` or `1`.
    #[must_use]
    pub fn flag(mut self, key: &'static str, on: bool) -> Self {
        self.0.push((key, u8::from(on).to_string()));
        self
    }

    /// Add `key=value`.
    #[must_use]
    pub fn value(mut self, key: &'static str, value: impl Display) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    /// Add `key=value` when a value is given.
    #[must_use]
    pub fn maybe(self, key: &'static str, value: Option<impl Display>) -> Self {
        match value {
            Some(value) => self.value(key, value),
            None => self,
        }
    }

    /// The pairs in insertion order.
    #[must_use]
    pub fn as_pairs(&self) -> &[(&'static str, String)] {
        &self.0
    }
}
