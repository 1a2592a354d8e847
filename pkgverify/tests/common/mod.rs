#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use ociclient::AuthStrategy;
use pkgverify::registry::{ApiOrigin, DEFAULT_REGISTRY_URL};
use pkgverify::{OciValidator, ProviderTable};

pub const CONFIG_DIGEST: &str = "sha256:abc123";
pub const PLATFORM_DIGEST: &str = "sha256:platform456";
pub const MOCK_TOKEN: &str = "mock-token";

#[derive(Clone)]
struct MockRoute {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
}

/// A request as seen by the mock registry
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// In-process registry answering canned responses by request path
#[derive(Clone, Default)]
pub struct MockRegistry {
    routes: HashMap<String, MockRoute>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct RunningRegistry {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    server: JoinHandle<()>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, status: StatusCode, body: impl Into<String>) -> Self {
        self.routes.insert(
            path.to_string(),
            MockRoute {
                status,
                body: body.into(),
                delay: None,
            },
        );
        self
    }

    pub fn delayed_route(mut self, path: &str, delay: Duration, body: impl Into<String>) -> Self {
        self.routes.insert(
            path.to_string(),
            MockRoute {
                status: StatusCode::OK,
                body: body.into(),
                delay: Some(delay),
            },
        );
        self
    }

    /// Serve a single-platform image whose config carries `labels`.
    pub fn image(self, repository: &str, tag: &str, labels: serde_json::Value) -> Self {
        self.route(
            &format!("/v2/{}/manifests/{}", repository, tag),
            StatusCode::OK,
            manifest(CONFIG_DIGEST),
        )
        .route(
            &format!("/v2/{}/blobs/{}", repository, CONFIG_DIGEST),
            StatusCode::OK,
            image_config(labels),
        )
    }

    pub fn token(self) -> Self {
        self.route("/token", StatusCode::OK, json!({ "token": MOCK_TOKEN }).to_string())
    }

    pub async fn start(self) -> RunningRegistry {
        // Use a random available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let requests = Arc::clone(&self.requests);
        let app = Router::new().fallback(serve).with_state(Arc::new(self));

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RunningRegistry {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
            server,
        }
    }
}

async fn serve(
    State(registry): State<Arc<MockRegistry>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    registry.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
    });

    match registry.routes.get(uri.path()) {
        Some(route) => {
            if let Some(delay) = route.delay {
                sleep(delay).await;
            }
            (
                route.status,
                [(header::CONTENT_TYPE, "application/json")],
                route.body.clone(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl RunningRegistry {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    /// Provider table where the default registry is this mock, behind a token handshake.
    pub fn token_protected_table(&self) -> ProviderTable {
        self.token_table_with_realm(&format!("{}/token", self.base_url))
    }

    /// Token-protected table whose tokens are served from `realm`.
    pub fn token_table_with_realm(&self, realm: &str) -> ProviderTable {
        ProviderTable::builtin().with_provider(
            DEFAULT_REGISTRY_URL,
            ApiOrigin {
                url: self.base_url.clone(),
                auth: AuthStrategy::BearerToken {
                    realm: realm.to_string(),
                    service: "registry.docker.io".to_string(),
                },
            },
        )
    }
}

impl Drop for RunningRegistry {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn validator() -> OciValidator {
    OciValidator::with_client(ProviderTable::builtin(), reqwest::Client::new())
}

pub fn manifest(config_digest: &str) -> String {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "digest": config_digest,
            "size": 1469
        },
        "layers": []
    })
    .to_string()
}

pub fn index(digests: &[&str]) -> String {
    let manifests: Vec<_> = digests
        .iter()
        .map(|digest| {
            json!({
                "mediaType": "application/vnd.oci.image.manifest.v1+json",
                "digest": digest,
                "size": 1024,
                "platform": { "architecture": "amd64", "os": "linux" }
            })
        })
        .collect();
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.index.v1+json",
        "manifests": manifests
    })
    .to_string()
}

pub fn image_config(labels: serde_json::Value) -> String {
    json!({
        "architecture": "amd64",
        "os": "linux",
        "config": { "Labels": labels }
    })
    .to_string()
}
