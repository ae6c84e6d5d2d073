use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::{
    error::{AppError, InvalidQuerySnafu},
    params::WireParams,
};

/// Extract json:api style query params on the serving side.
///
/// `?page[limit]=10&filter[last-name]=smith` becomes
/// `{"page": {"limit": "10"}, "filter": {"last-name": "smith"}}`; feed it to
/// [`QuerySerializer::deserialize`](crate::QuerySerializer::deserialize) for
/// internal field names.
/// ```rust,no_run
/// use axum::{routing::get, Json, Router};
/// use tabular_query::{QuerySerializer, QueryState, WireQuery};
///
/// async fn list_users(WireQuery(params): WireQuery) -> Json<QueryState> {
///     Json(QuerySerializer::default().deserialize(&params))
/// }
///
/// let app: Router = Router::new().route("/users", get(list_users));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireQuery(pub WireParams);

#[async_trait]
impl<S> FromRequestParts<S> for WireQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri).map_err(
            |rejection| {
                InvalidQuerySnafu {
                    message: rejection.body_text(),
                }
                .build()
            },
        )?;
        let params = WireParams::from_query_pairs(pairs)?;
        tracing::debug!("extracted query params {params:?}");
        Ok(WireQuery(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(uri: &str) -> Result<WireQuery, AppError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        WireQuery::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn percent_encoded_brackets() {
        let WireQuery(params) =
            extract("/users?page%5Blimit%5D=10&filter%5Buser.first-name%5D=Jo%20Ann")
                .await
                .unwrap();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({"page": {"limit": "10"}, "filter": {"user.first-name": "Jo Ann"}})
        );
    }

    #[tokio::test]
    async fn no_query_is_empty() {
        let WireQuery(params) = extract("/users").await.unwrap();
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn malformed_brackets_are_rejected() {
        let err = extract("/users?page%5Blimit=10").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidQuery { .. }));
    }
}
