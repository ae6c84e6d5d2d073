use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One table column, usually handed over by the host as json:
/// ```rust
/// use tabular_query::Column;
///
/// let column: Column = serde_json::from_value(serde_json::json!({
///     "property": "isAdmin",
///     "label": "Is Admin",
///     "list": [{"label": "Yes", "value": true}, {"label": "No", "value": false}]
/// })).unwrap();
/// assert!(column.sort);
/// assert_eq!(column.kind, "text");
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// camelCase record property, required for filtering and sorting
    #[serde(default)]
    pub property: Option<String>,

    pub label: String,

    /// filter input type
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,

    #[serde(default = "default_sort")]
    pub sort: bool,

    /// filter through a fixed set of values instead of free text
    #[serde(default)]
    pub list: Option<Vec<ListOption>>,

    /// initial sort sent with the first request
    #[serde(default)]
    pub default_sort: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ListOption {
    pub label: String,
    pub value: Value,
}

fn default_kind() -> String {
    "text".to_owned()
}

fn default_sort() -> bool {
    true
}

impl Column {
    pub fn new(property: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            property: Some(property.into()),
            label: label.into(),
            kind: default_kind(),
            sort: default_sort(),
            list: None,
            default_sort: None,
        }
    }

    /// A column without a property, e.g. an actions column.
    pub fn label_only(label: impl Into<String>) -> Self {
        Self {
            property: None,
            sort: false,
            ..Self::new("", label)
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_default_sort(mut self, sort: impl Into<String>) -> Self {
        self.default_sort = Some(sort.into());
        self
    }

    pub fn unsortable(mut self) -> Self {
        self.sort = false;
        self
    }

    pub fn with_list(mut self, list: Vec<ListOption>) -> Self {
        self.list = Some(list);
        self
    }

    pub fn is_sortable(&self) -> bool {
        self.sort && self.property.is_some()
    }
}
