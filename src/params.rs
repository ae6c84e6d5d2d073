use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snafu::ensure;

use crate::error::{InvalidQuerySnafu, Result};

/// Request parameters in the shape the backend expects.
///
/// Keys keep insertion order so filters are sent in the order the table
/// lists them. Nested objects become bracketed keys on the query string:
/// `{"page": {"limit": 10}}` => `page[limit]=10`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct WireParams(Map<String, Value>);

impl WireParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Overlay `other` on top of these params; colliding keys take the
    /// value from `other`.
    pub fn merge(&mut self, other: &Map<String, Value>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// The nested `filter` object, if present.
    pub fn filter(&self) -> Option<&Map<String, Value>> {
        self.0.get("filter").and_then(Value::as_object)
    }

    pub fn sort(&self) -> Option<&str> {
        self.0.get("sort").and_then(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
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

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Flatten into `(key, value)` pairs ready for a query string.
    ///
    /// Nulls are skipped, booleans and numbers are rendered as text and
    /// arrays are joined with `,`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.0 {
            flatten_into(key.clone(), value, &mut pairs);
        }
        pairs
    }

    /// Nest bracketed query string keys back into objects:
    /// `filter[user.first-name]=x` => `{"filter": {"user.first-name": "x"}}`.
    ///
    /// Values stay strings; a repeated key keeps the last value.
    pub fn from_query_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut map = Map::new();
        for (key, value) in pairs {
            let path = split_key(&key)?;
            insert_path(&mut map, &path, Value::String(value))?;
        }
        Ok(Self(map))
    }
}

impl From<Map<String, Value>> for WireParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl IntoIterator for WireParams {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn flatten_into(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child, value) in map {
                flatten_into(format!("{key}[{child}]"), value, pairs);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((key, joined));
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                pairs.push((key, text));
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `page[limit]` => `["page", "limit"]`
fn split_key(key: &str) -> Result<Vec<String>> {
    let Some(open) = key.find('[') else {
        ensure!(
            !key.is_empty() && !key.contains(']'),
            InvalidQuerySnafu {
                message: format!("malformed key `{key}`"),
            }
        );
        return Ok(vec![key.to_owned()]);
    };
    let head = &key[..open];
    ensure!(
        !head.is_empty() && !head.contains(']'),
        InvalidQuerySnafu {
            message: format!("key `{key}` has no valid name before `[`"),
        }
    );
    let mut path = vec![head.to_owned()];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let close = rest.find(']');
        ensure!(
            rest.starts_with('[') && close.is_some(),
            InvalidQuerySnafu {
                message: format!("unbalanced brackets in `{key}`"),
            }
        );
        let close = close.unwrap_or_default();
        let segment = &rest[1..close];
        ensure!(
            !segment.is_empty() && !segment.contains('['),
            InvalidQuerySnafu {
                message: format!("empty or nested segment in `{key}`"),
            }
        );
        path.push(segment.to_owned());
        rest = &rest[close + 1..];
    }
    Ok(path)
}

fn insert_path(map: &mut Map<String, Value>, path: &[String], value: Value) -> Result<()> {
    let (head, tail) = match path.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };
    if tail.is_empty() {
        map.insert(head.clone(), value);
        return Ok(());
    }
    let child = map
        .entry(head.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    match child {
        Value::Object(child) => insert_path(child, tail, value),
        _ => InvalidQuerySnafu {
            message: format!("`{head}` is both a value and a group"),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn flatten_nested_params() {
        let params: WireParams = serde_json::from_value(json!({
            "page": {"limit": 10, "offset": 10},
            "sort": "-last-name",
            "filter": {"is-admin": true, "user.first-name": "jo"},
            "filter[is-open]": "1",
            "include": ["hours", "owner"],
            "skipped": null
        }))
        .unwrap();
        assert_eq!(
            params.to_query_pairs(),
            pairs(&[
                ("page[limit]", "10"),
                ("page[offset]", "10"),
                ("sort", "-last-name"),
                ("filter[is-admin]", "true"),
                ("filter[user.first-name]", "jo"),
                ("filter[is-open]", "1"),
                ("include", "hours,owner"),
            ])
        );
    }

    #[test]
    fn nest_bracketed_keys() {
        let params = WireParams::from_query_pairs(pairs(&[
            ("page[limit]", "10"),
            ("page[offset]", "20"),
            ("filter[last-name]", "smith"),
            ("sort", "-updated-at"),
        ]))
        .unwrap();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "page": {"limit": "10", "offset": "20"},
                "filter": {"last-name": "smith"},
                "sort": "-updated-at"
            })
        );
        assert_eq!(params.sort(), Some("-updated-at"));
        assert_eq!(params.filter().map(|f| f.len()), Some(1));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        for key in ["page[limit", "[limit]", "page[]", "page]", "page[a]b", "a]b[c]"] {
            let result = WireParams::from_query_pairs(pairs(&[(key, "1")]));
            assert!(result.is_err(), "{key} should be rejected");
        }
    }

    #[test]
    fn value_and_group_conflict_is_rejected() {
        let result = WireParams::from_query_pairs(pairs(&[("page", "1"), ("page[limit]", "10")]));
        assert!(result.is_err());
    }

    #[test]
    fn merge_overrides_existing_keys() {
        let mut params = WireParams::new();
        params.insert("sort", json!("name"));
        params.insert("include", json!("hours"));
        let overlay = json!({"sort": "-name"});
        params.merge(overlay.as_object().unwrap());
        assert_eq!(params.sort(), Some("-name"));
        assert_eq!(params.len(), 2);
    }
}
