use serde_json::{Map, Value};

use crate::params::WireParams;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// `page * limit - limit`, or `None` when either side is missing, the limit
/// is zero, the page is below one or the arithmetic overflows.
pub fn offset_for(page: Option<u64>, limit: Option<u64>) -> Option<u64> {
    let (page, limit) = (page?, limit?);
    if limit == 0 {
        return None;
    }
    page.checked_mul(limit)?.checked_sub(limit)
}

/// Number of pages needed to show `total` records `limit` at a time.
pub fn page_limit(total: Option<f64>, limit: Option<u64>) -> Option<u64> {
    let pages = (total? / limit? as f64).ceil();
    if pages.is_finite() && pages >= 0.0 {
        Some(pages as u64)
    } else {
        None
    }
}

/// Where pagination values live inside the wire params.
///
/// The default [`JsonApiPagination`] follows
/// <http://jsonapi.org/format/#fetching-pagination>: `?page[offset]=` and
/// `?page[limit]=`. Backends that expect `?offset=&limit=` use
/// [`FlatPagination`] or their own implementation.
pub trait PaginationShape: Send + Sync {
    fn write(&self, params: &mut WireParams, limit: Option<u64>, offset: Option<u64>);

    fn limit(&self, params: &WireParams) -> Option<u64>;

    fn offset(&self, params: &WireParams) -> Option<u64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonApiPagination;

impl PaginationShape for JsonApiPagination {
    fn write(&self, params: &mut WireParams, limit: Option<u64>, offset: Option<u64>) {
        let mut page = Map::new();
        page.insert("limit".to_owned(), limit.map(Value::from).unwrap_or(Value::Null));
        page.insert("offset".to_owned(), offset.map(Value::from).unwrap_or(Value::Null));
        params.insert("page", Value::Object(page));
    }

    fn limit(&self, params: &WireParams) -> Option<u64> {
        params.get("page").and_then(|page| page.get("limit")).and_then(as_u64)
    }

    fn offset(&self, params: &WireParams) -> Option<u64> {
        params.get("page").and_then(|page| page.get("offset")).and_then(as_u64)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPagination;

impl PaginationShape for FlatPagination {
    fn write(&self, params: &mut WireParams, limit: Option<u64>, offset: Option<u64>) {
        params.insert("limit", limit.map(Value::from).unwrap_or(Value::Null));
        params.insert("offset", offset.map(Value::from).unwrap_or(Value::Null));
    }

    fn limit(&self, params: &WireParams) -> Option<u64> {
        params.get("limit").and_then(as_u64)
    }

    fn offset(&self, params: &WireParams) -> Option<u64> {
        params.get("offset").and_then(as_u64)
    }
}

/// Numbers arrive as json numbers from our own serializer and as strings
/// from a parsed query string.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
