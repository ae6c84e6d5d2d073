use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pagination::{DEFAULT_LIMIT, DEFAULT_PAGE};

/// Snapshot of everything that shapes one request for table data.
///
/// Rebuilt by the table for every request; `page` and `limit` are optional
/// because a host may hand over values it could not parse, which simply
/// leave the offset unresolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryState {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub static_params: Map<String, Value>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: Some(DEFAULT_PAGE),
            limit: Some(DEFAULT_LIMIT),
            sort: None,
            filters: Vec::new(),
            static_params: Map::new(),
        }
    }
}

impl QueryState {
    pub fn with_page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: impl Into<SortKey>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(field, value));
        self
    }

    pub fn with_static_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.static_params.insert(key.into(), value.into());
        self
    }
}

/// One column constraint, `field` in internal (camelCase) naming.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Empty strings and nulls are never sent as constraints.
    pub fn is_blank(&self) -> bool {
        match &self.value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A sort property, prefixed with `-` when descending: `-lastName`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SortKey(String);

impl SortKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn ascending(property: &str) -> Self {
        Self(property.to_owned())
    }

    pub fn descending(property: &str) -> Self {
        Self(format!("-{property}"))
    }

    pub fn property(&self) -> &str {
        self.0.strip_prefix('-').unwrap_or(&self.0)
    }

    pub fn direction(&self) -> SortDirection {
        if self.0.starts_with('-') {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild the key with the property passed through `f`, keeping the
    /// direction. `None` when `f` yields nothing.
    pub fn map_property<F>(&self, f: F) -> Option<SortKey>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let property = f(self.property())?;
        Some(match self.direction() {
            SortDirection::Ascending => SortKey(property),
            SortDirection::Descending => SortKey(format!("-{property}")),
        })
    }
}

impl From<&str> for SortKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SortKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
