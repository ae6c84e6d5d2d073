use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The body returned by a JSON:API collection endpoint.
///
/// Every part is optional on the wire so that a malformed body still
/// decodes and degrades to null page info instead of failing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub meta: Option<Meta>,

    #[serde(default)]
    pub data: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// total number of records matching the query, kept as raw json so a
    /// non numeric total is observable rather than rejected
    #[serde(default)]
    pub total: Option<Value>,
}

impl ResponseEnvelope {
    pub fn new(data: Vec<Value>, total: u64) -> Self {
        Self {
            meta: Some(Meta {
                total: Some(Value::from(total)),
            }),
            data,
            errors: None,
        }
    }

    pub fn total(&self) -> Option<f64> {
        self.meta.as_ref()?.total.as_ref()?.as_f64()
    }
}

/// A single entry of a JSON:API `errors` array.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ErrorSource>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ErrorSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

/// Page count derived from a response, `None` when it can not be computed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPageInfo {
    pub page_limit: Option<u64>,
}

/// Query inputs recovered from the params echoed with a response,
/// expressed in internal field names.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub filter: Map<String, Value>,
    pub sort: Option<String>,
}
