use std::{fmt, sync::Arc};

use serde_json::{Map, Value};

use crate::{
    casing::{translate_path, DashCase, Direction, FieldCasing},
    pagination::{offset_for, page_limit, JsonApiPagination, PaginationShape},
    params::WireParams,
    query::{Filter, QueryState, SortKey},
    response::{NormalizedPageInfo, QueryPatch, ResponseEnvelope},
};

/// Translates table query state into backend request params and response
/// params back into table state.
///
/// The defaults follow json:api: dasherized field names and
/// `page[limit]`/`page[offset]` pagination. Either half can be swapped:
/// ```rust
/// use tabular_query::{
///     casing::CamelCase, pagination::FlatPagination, QuerySerializer, QueryState,
/// };
///
/// let serializer = QuerySerializer::new(CamelCase, FlatPagination);
/// let state = QueryState::default().with_page(3).with_sort("-lastName");
/// let params = serializer.serialize(&state);
/// assert_eq!(params.get("offset"), Some(&serde_json::json!(20)));
/// assert_eq!(params.sort(), Some("-lastName"));
/// ```
#[derive(Clone)]
pub struct QuerySerializer {
    casing: Arc<dyn FieldCasing>,
    pagination: Arc<dyn PaginationShape>,
}

impl Default for QuerySerializer {
    fn default() -> Self {
        Self::new(DashCase, JsonApiPagination)
    }
}

impl fmt::Debug for QuerySerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySerializer").finish_non_exhaustive()
    }
}

impl QuerySerializer {
    pub fn new<C, P>(casing: C, pagination: P) -> Self
    where
        C: FieldCasing + 'static,
        P: PaginationShape + 'static,
    {
        Self {
            casing: Arc::new(casing),
            pagination: Arc::new(pagination),
        }
    }

    pub fn with_casing<C: FieldCasing + 'static>(mut self, casing: C) -> Self {
        self.casing = Arc::new(casing);
        self
    }

    pub fn with_pagination<P: PaginationShape + 'static>(mut self, pagination: P) -> Self {
        self.pagination = Arc::new(pagination);
        self
    }

    /// Translate a field name, dotted relationship paths segment by segment.
    pub fn translate_field(&self, field: &str, direction: Direction) -> Option<String> {
        translate_path(self.casing.as_ref(), field, direction)
    }

    /// Build the params for one request.
    ///
    /// Pagination, filter and sort are computed first, static params are
    /// laid over them last so they win on any shared key.
    pub fn serialize(&self, state: &QueryState) -> WireParams {
        let mut params = WireParams::new();
        self.serialize_pagination(state, &mut params);
        self.serialize_filter(&state.filters, &mut params);
        self.serialize_sort(state.sort.as_ref(), &mut params);
        params.merge(&state.static_params);
        tracing::debug!("serialized query params {params:?}");
        params
    }

    fn serialize_pagination(&self, state: &QueryState, params: &mut WireParams) {
        let offset = offset_for(state.page, state.limit);
        if offset.is_none() {
            tracing::debug!(
                "offset unresolved for page {:?} and limit {:?}",
                state.page,
                state.limit
            );
        }
        self.pagination.write(params, state.limit, offset);
    }

    fn serialize_filter(&self, filters: &[Filter], params: &mut WireParams) {
        let mut filter = Map::new();
        for entry in filters.iter().filter(|entry| !entry.is_blank()) {
            match self.translate_field(&entry.field, Direction::ToWire) {
                Some(key) => {
                    filter.insert(key, entry.value.clone());
                }
                None => tracing::debug!("drop filter with untranslatable field {:?}", entry.field),
            }
        }
        params.insert("filter", Value::Object(filter));
    }

    fn serialize_sort(&self, sort: Option<&SortKey>, params: &mut WireParams) {
        let sort = sort.and_then(|key| {
            key.map_property(|property| self.translate_field(property, Direction::ToWire))
        });
        if let Some(sort) = sort {
            params.insert("sort", Value::String(sort.to_string()));
        }
    }

    /// Recover table state from a response and the params that produced it.
    pub fn normalize(
        &self,
        response: &ResponseEnvelope,
        params: &WireParams,
    ) -> (QueryPatch, NormalizedPageInfo) {
        let page_info = NormalizedPageInfo {
            page_limit: page_limit(response.total(), self.pagination.limit(params)),
        };
        let patch = QueryPatch {
            filter: params
                .filter()
                .map(|filter| self.normalize_filter(filter))
                .unwrap_or_default(),
            sort: self.normalize_sort(params.sort()).map(|key| key.to_string()),
        };
        tracing::debug!("normalized response into {patch:?} {page_info:?}");
        (patch, page_info)
    }

    fn normalize_filter(&self, filter: &Map<String, Value>) -> Map<String, Value> {
        filter
            .iter()
            .filter_map(|(key, value)| match self.translate_field(key, Direction::FromWire) {
                Some(field) => Some((field, value.clone())),
                None => {
                    tracing::debug!("drop echoed filter with untranslatable key {key:?}");
                    None
                }
            })
            .collect()
    }

    fn normalize_sort(&self, sort: Option<&str>) -> Option<SortKey> {
        SortKey::from(sort?)
            .map_property(|property| self.translate_field(property, Direction::FromWire))
    }

    /// Read params arriving at a backend back into query state.
    ///
    /// Keys other than pagination, `filter` and `sort` are kept as static
    /// params.
    pub fn deserialize(&self, params: &WireParams) -> QueryState {
        let limit = self.pagination.limit(params);
        let offset = self.pagination.offset(params).unwrap_or(0);
        let page = match limit {
            Some(limit) if limit > 0 => offset.checked_div(limit).and_then(|p| p.checked_add(1)),
            _ => None,
        };

        let mut pagination_keys = WireParams::new();
        self.pagination.write(&mut pagination_keys, None, None);

        let filters = params
            .filter()
            .map(|filter| {
                self.normalize_filter(filter)
                    .into_iter()
                    .map(|(field, value)| Filter { field, value })
                    .collect()
            })
            .unwrap_or_default();

        let static_params = params
            .iter()
            .filter(|(key, _)| {
                pagination_keys.get(key).is_none() && key.as_str() != "filter" && key.as_str() != "sort"
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        QueryState {
            page,
            limit,
            sort: self.normalize_sort(params.sort()),
            filters,
            static_params,
        }
    }
}
