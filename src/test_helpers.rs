use std::convert::Infallible;
// mainly copy from axum/test_helpers
use std::net::SocketAddr;

use axum::{extract::Request, response::Response};
use http::StatusCode;
use tokio::net::TcpListener;
use tower::make::Shared;
use tower_service::Service;

use crate::backend::{BackendConfig, HttpBackend};

/// Serve an app on an ephemeral local port, for driving [`HttpBackend`]
/// against a fake collection endpoint.
/// ```rust,no_run
/// use axum::{Router, routing::get, Json};
/// use tabular_query::{test_helpers::TestClient, QueryBackend, WireParams};
///
/// let app = Router::new().route(
///     "/api/users",
///     get(|| async { Json(serde_json::json!({"meta": {"total": 0}, "data": []})) }),
/// );
/// # async {
/// let client = TestClient::new(app);
/// let envelope = client.backend().query("users", &WireParams::new()).await.unwrap();
/// assert!(envelope.data.is_empty());
/// # };
/// ```
pub struct TestClient {
    client: reqwest::Client,
    addr: SocketAddr,
}

impl TestClient {
    pub fn new<S>(svc: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
        S::Future: Send,
    {
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        std_listener.set_nonblocking(true).unwrap();
        let listener = TcpListener::from_std(std_listener).unwrap();

        let addr = listener.local_addr().unwrap();
        tracing::debug!("test server listening on {addr}");

        tokio::spawn(async move {
            axum::serve(listener, Shared::new(svc))
                .await
                .expect("server error")
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        TestClient { client, addr }
    }

    /// `http://127.0.0.1:{port}/api`
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// A backend whose collections live under [`TestClient::base_url`].
    pub fn backend(&self) -> HttpBackend {
        HttpBackend::new(BackendConfig::new(self.base_url())).unwrap()
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        RequestBuilder {
            builder: self.client.get(format!("http://{}{}", self.addr, url)),
        }
    }
}

pub struct RequestBuilder {
    builder: reqwest::RequestBuilder,
}

impl RequestBuilder {
    pub async fn send(self) -> TestResponse {
        TestResponse {
            response: self.builder.send().await.unwrap(),
        }
    }

    pub fn query<T: serde::Serialize + ?Sized>(mut self, query: &T) -> Self {
        self.builder = self.builder.query(query);
        self
    }
}

#[derive(Debug)]
pub struct TestResponse {
    response: reqwest::Response,
}

impl TestResponse {
    pub async fn text(self) -> String {
        self.response.text().await.unwrap()
    }

    pub async fn json<T>(self) -> T
    where
        T: serde::de::DeserializeOwned,
    {
        self.response.json().await.unwrap()
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.response.status().as_u16()).unwrap()
    }
}
