use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use snafu::{Location, Snafu};

use crate::response::ApiError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum AppError {
    #[snafu(display("request to backend failed: {}", source))]
    Transport {
        source: reqwest::Error,
        location: Location,
    },

    #[snafu(display("decode response body failed: {}", source))]
    Decode {
        source: serde_json::Error,
        location: Location,
    },

    #[snafu(display("backend answered with status {} and {} error(s)", status, errors.len()))]
    Api {
        status: u16,
        errors: Vec<ApiError>,
        location: Location,
    },

    #[snafu(display("invalid config value for {}: {}", key, value))]
    Config {
        key: String,
        value: String,
        location: Location,
    },

    #[snafu(display("invalid query string: {}", message))]
    InvalidQuery { message: String, location: Location },
}

impl AppError {
    /// field level errors reported by the backend, if any
    pub fn api_errors(&self) -> Option<&[ApiError]> {
        match self {
            AppError::Api { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = match self {
            AppError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            AppError::Transport { .. } | AppError::Decode { .. } | AppError::Api { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("error happened: {self:?}");
        (
            status_code,
            Json(serde_json::json!({
                "errors": [{
                    "status": status_code.as_u16().to_string(),
                    "detail": format!("{}", self)
                }]
            })),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use snafu::IntoError;

    #[test]
    fn invalid_query_is_bad_request() {
        let err = InvalidQuerySnafu {
            message: "bad bracket",
        }
        .build();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_errors_are_exposed() {
        let err = ApiSnafu {
            status: 422u16,
            errors: vec![ApiError {
                detail: Some("must not be blank".to_owned()),
                ..Default::default()
            }],
        }
        .build();
        assert_eq!(err.api_errors().map(|e| e.len()), Some(1));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn decode_error_has_no_api_errors() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DecodeSnafu.into_error(source);
        assert!(err.api_errors().is_none());
    }
}
