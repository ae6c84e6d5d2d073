use serde_json::{Map, Value};

use crate::{
    backend::QueryBackend,
    columns::Column,
    error::Result,
    pagination::{DEFAULT_LIMIT, DEFAULT_PAGE},
    query::{Filter, QueryState, SortDirection, SortKey},
    response::{ApiError, NormalizedPageInfo, QueryPatch},
    serializer::QuerySerializer,
};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Success!";
pub const DEFAULT_FAILURE_MESSAGE: &str = "There was an issue. Please check below for errors.";

/// State behind one data table: the query inputs, the last fetched page and
/// the request lifecycle flags.
///
/// The host owns rendering and calls [`TableState::request`] again whenever
/// an input changes.
#[derive(Debug, Clone)]
pub struct TableState {
    pub columns: Vec<Column>,
    pub model_name: Option<String>,
    pub make_request: bool,

    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// number of pages, `None` when the last response could not tell
    pub page_limit: Option<u64>,
    pub sort: Option<SortKey>,
    pub filters: Vec<Filter>,
    pub static_params: Map<String, Value>,

    pub records: Vec<Value>,
    pub last_query: QueryPatch,

    pub is_loading: bool,
    pub is_loaded: bool,
    pub is_success: bool,
    pub is_failure: bool,
    pub errors: Option<Vec<ApiError>>,
    pub success_message: String,
    pub failure_message: String,
}

impl TableState {
    /// The last column carrying a `default_sort` sets the initial sort.
    pub fn new(columns: Vec<Column>) -> Self {
        let sort = columns
            .iter()
            .rev()
            .find_map(|column| column.default_sort.as_deref())
            .map(SortKey::from);
        Self {
            columns,
            model_name: None,
            make_request: true,
            page: Some(DEFAULT_PAGE),
            limit: Some(DEFAULT_LIMIT),
            page_limit: Some(0),
            sort,
            filters: Vec::new(),
            static_params: Map::new(),
            records: Vec::new(),
            last_query: QueryPatch::default(),
            is_loading: false,
            is_loaded: false,
            is_success: false,
            is_failure: false,
            errors: None,
            success_message: DEFAULT_SUCCESS_MESSAGE.to_owned(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_owned(),
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_static_params(mut self, static_params: Map<String, Value>) -> Self {
        self.static_params = static_params;
        self
    }

    pub fn column_length(&self) -> usize {
        self.columns.len()
    }

    /// Whether any column can be filtered on.
    pub fn is_column_filters(&self) -> bool {
        self.columns.iter().any(|column| column.property.is_some())
    }

    /// Toggle sorting on `property`: a column already sorted ascending
    /// flips to descending, anything else sorts ascending.
    pub fn sort_by(&mut self, property: &str) {
        let next = match &self.sort {
            Some(current) if current.as_str() == property => SortKey::descending(property),
            _ => SortKey::ascending(property),
        };
        tracing::debug!("sort changed from {:?} to {next}", self.sort);
        self.sort = Some(next);
    }

    pub fn sort_direction(&self) -> Option<SortDirection> {
        self.sort.as_ref().map(SortKey::direction)
    }

    /// Set the filter on `field`, replacing an existing one in place.
    pub fn set_filter(&mut self, field: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.filters.iter_mut().find(|filter| filter.field == field) {
            Some(filter) => filter.value = value,
            None => self.filters.push(Filter::new(field, value)),
        }
    }

    pub fn clear_filter(&mut self, field: &str) {
        self.filters.retain(|filter| filter.field != field);
    }

    pub fn set_page(&mut self, page: u64) {
        self.page = Some(page);
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub fn query_state(&self) -> QueryState {
        QueryState {
            page: self.page,
            limit: self.limit,
            sort: self.sort.clone(),
            filters: self.filters.clone(),
            static_params: self.static_params.clone(),
        }
    }

    /// Whether the table has something to show, even if that is only the
    /// empty message or errors.
    pub fn is_record_loaded(&self) -> bool {
        self.is_loaded || self.errors.is_some() || self.model_name.is_none()
    }

    pub fn reset(&mut self) {
        self.is_loading = false;
        self.errors = None;
        self.is_success = false;
        self.is_failure = false;
        self.success_message = DEFAULT_SUCCESS_MESSAGE.to_owned();
        self.failure_message = DEFAULT_FAILURE_MESSAGE.to_owned();
    }

    /// Record a failed request, keeping any field level errors.
    pub fn fail(&mut self, errors: Option<Vec<ApiError>>) {
        self.reset();
        self.is_failure = true;
        self.page_limit = None;
        if errors.is_some() {
            self.errors = errors;
        }
    }

    /// Store a page of records with the state normalized from its response.
    pub fn apply(&mut self, records: Vec<Value>, patch: QueryPatch, page_info: NormalizedPageInfo) {
        self.page_limit = page_info.page_limit;
        self.last_query = patch;
        self.records = records;
        self.is_loading = false;
        self.is_loaded = true;
        self.is_success = true;
    }

    /// Fetch the current page through `backend`.
    ///
    /// Does nothing when `make_request` is off or no model is set. Failures
    /// are recorded on the table and also returned.
    pub async fn request<B>(&mut self, serializer: &QuerySerializer, backend: &B) -> Result<()>
    where
        B: QueryBackend + ?Sized,
    {
        if !self.make_request {
            return Ok(());
        }
        let Some(model_name) = self.model_name.clone() else {
            tracing::debug!("no model name set, skip request");
            return Ok(());
        };
        self.reset();
        self.is_loading = true;

        let params = serializer.serialize(&self.query_state());
        match backend.query(&model_name, &params).await {
            Ok(envelope) => {
                let (patch, page_info) = serializer.normalize(&envelope, &params);
                self.apply(envelope.data, patch, page_info);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("request for {model_name} failed: {err}");
                self.fail(err.api_errors().map(<[ApiError]>::to_vec));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ApiSnafu, params::WireParams, response::ResponseEnvelope};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("username", "Username").with_default_sort("username"),
            Column::new("emailAddress", "Email"),
            Column::new("updatedAt", "Last Updated")
                .with_kind("date")
                .with_default_sort("-updatedAt"),
            Column::label_only("Actions"),
        ]
    }

    struct Fixed {
        result: fn() -> Result<ResponseEnvelope>,
        seen: Mutex<Vec<(String, WireParams)>>,
    }

    impl Fixed {
        fn new(result: fn() -> Result<ResponseEnvelope>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryBackend for Fixed {
        async fn query(&self, model_name: &str, params: &WireParams) -> Result<ResponseEnvelope> {
            self.seen
                .lock()
                .unwrap()
                .push((model_name.to_owned(), params.clone()));
            (self.result)()
        }
    }

    #[test]
    fn last_default_sort_wins() {
        let table = TableState::new(columns());
        assert_eq!(table.sort, Some(SortKey::from("-updatedAt")));
        assert_eq!(table.column_length(), 4);
        assert!(table.is_column_filters());
        assert!(!TableState::new(vec![Column::label_only("Actions")]).is_column_filters());
    }

    #[test]
    fn sort_by_toggles_direction() {
        let mut table = TableState::new(Vec::new());
        table.sort_by("name");
        assert_eq!(table.sort.as_ref().map(SortKey::as_str), Some("name"));
        table.sort_by("name");
        assert_eq!(table.sort.as_ref().map(SortKey::as_str), Some("-name"));
        assert_eq!(table.sort_direction(), Some(SortDirection::Descending));
        table.sort_by("name");
        assert_eq!(table.sort.as_ref().map(SortKey::as_str), Some("name"));
        table.sort_by("email");
        assert_eq!(table.sort.as_ref().map(SortKey::as_str), Some("email"));
    }

    #[test]
    fn set_filter_replaces_in_place() {
        let mut table = TableState::new(columns());
        table.set_filter("username", "jo");
        table.set_filter("isAdmin", true);
        table.set_filter("username", "joe");
        assert_eq!(
            table.query_state().filters,
            vec![Filter::new("username", "joe"), Filter::new("isAdmin", true)]
        );
        table.clear_filter("username");
        assert_eq!(table.filters.len(), 1);
    }

    #[test]
    fn record_loaded_without_model() {
        let table = TableState::new(columns());
        assert!(table.is_record_loaded());
        assert!(!table.clone().with_model_name("user").is_record_loaded());
    }

    #[test]
    fn fail_resets_page_limit_and_keeps_errors() {
        let mut table = TableState::new(columns());
        table.success_message = "Saved".to_owned();
        table.fail(Some(vec![ApiError {
            detail: Some("bad filter".to_owned()),
            ..Default::default()
        }]));
        assert!(table.is_failure);
        assert_eq!(table.page_limit, None);
        assert_eq!(table.errors.as_ref().map(Vec::len), Some(1));
        assert_eq!(table.success_message, DEFAULT_SUCCESS_MESSAGE);
        assert!(table.is_record_loaded());
    }

    #[tokio::test]
    async fn request_applies_response() {
        let backend = Fixed::new(|| {
            Ok(ResponseEnvelope::new(
                vec![json!({"id": "1"}), json!({"id": "2"})],
                95,
            ))
        });
        let mut table = TableState::new(columns()).with_model_name("user");
        table.set_page(2);
        table.set_filter("isAdmin", true);
        table.request(&QuerySerializer::default(), &backend).await.unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.page_limit, Some(10));
        assert!(table.is_success && !table.is_loading);
        assert_eq!(table.last_query.sort.as_deref(), Some("-updatedAt"));

        let seen = backend.seen.lock().unwrap();
        let (model_name, params) = &seen[0];
        assert_eq!(model_name, "user");
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({
                "page": {"limit": 10, "offset": 10},
                "filter": {"is-admin": true},
                "sort": "-updated-at"
            })
        );
    }

    #[tokio::test]
    async fn request_failure_is_recorded() {
        let backend = Fixed::new(|| {
            ApiSnafu {
                status: 400u16,
                errors: vec![ApiError {
                    title: Some("Invalid filter".to_owned()),
                    ..Default::default()
                }],
            }
            .fail()
        });
        let mut table = TableState::new(columns()).with_model_name("user");
        assert!(table.request(&QuerySerializer::default(), &backend).await.is_err());
        assert!(table.is_failure && !table.is_loading);
        assert_eq!(table.page_limit, None);
        assert_eq!(
            table.errors.unwrap()[0].title.as_deref(),
            Some("Invalid filter")
        );
    }

    #[tokio::test]
    async fn request_skipped_when_disabled() {
        let backend = Fixed::new(|| Ok(ResponseEnvelope::default()));
        let mut table = TableState::new(columns()).with_model_name("user");
        table.make_request = false;
        table.request(&QuerySerializer::default(), &backend).await.unwrap();
        assert!(backend.seen.lock().unwrap().is_empty());
        assert!(!table.is_loaded);
    }
}
