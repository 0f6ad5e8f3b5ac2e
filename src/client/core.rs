// File: src/client/core.rs
use crate::client::auth::BearerAuthLayer;
use crate::client::error::ApiError;
use crate::config::Config;
use crate::model::{Event, GalleryImage, Officer, Resource};

use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower::ServiceExt;
use tower_layer::Layer;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, String>;

const CLIENT_USER_AGENT: &str = concat!("gsa-portal/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    #[serde(default)]
    pub version: String,
}

/// Client for the association's REST backend (`/api/...`).
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: HttpsClient,
    base: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base = backend_url.trim().trim_end_matches('/').to_string();
        let uri: Uri = base
            .parse()
            .map_err(|_| ApiError::InvalidUrl(backend_url.to_string()))?;
        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ApiError::InvalidUrl(backend_url.to_string()));
        }

        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        root_store.add_parsable_certificates(result.certs);
        if root_store.is_empty() {
            log::warn!("No system certificates found; https backends will fail verification");
        }
        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let https_connector = HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .build();

        let http = Client::builder(TokioExecutor::new()).build(https_connector);
        Ok(Self {
            http,
            base,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.backend_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    // --- AUTH ---

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let credentials = Credentials { username, password };
        self.send_json(Method::POST, "/auth/login", Some(&credentials), None)
            .await
    }

    pub async fn verify(&self, token: &str) -> Result<VerifyResponse, ApiError> {
        self.send_json::<(), _>(Method::GET, "/auth/verify", None, Some(token))
            .await
    }

    // --- RESOURCES ---

    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        self.send_json::<(), _>(Method::GET, &collection_path::<R>(), None, None)
            .await
    }

    pub async fn create<R: Resource>(&self, token: &str, draft: &R::Draft) -> Result<R, ApiError> {
        self.send_json(Method::POST, &collection_path::<R>(), Some(draft), Some(token))
            .await
    }

    pub async fn update<R: Resource>(
        &self,
        token: &str,
        id: &str,
        draft: &R::Draft,
    ) -> Result<R, ApiError> {
        self.send_json(Method::PUT, &item_path::<R>(id), Some(draft), Some(token))
            .await
    }

    pub async fn delete<R: Resource>(&self, token: &str, id: &str) -> Result<(), ApiError> {
        let req = self.build(Method::DELETE, &item_path::<R>(id), None)?;
        self.send(req, Some(token)).await.map(|_| ())
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.list::<Event>().await
    }

    pub async fn list_officers(&self) -> Result<Vec<Officer>, ApiError> {
        self.list::<Officer>().await
    }

    pub async fn list_gallery(&self) -> Result<Vec<GalleryImage>, ApiError> {
        self.list::<GalleryImage>().await
    }

    // --- MISC ---

    /// Asks the backend to insert its demo data; it is a no-op once seeded.
    pub async fn seed(&self) -> Result<(), ApiError> {
        let req = self.build(Method::POST, "/seed", None)?;
        self.send(req, None).await.map(|_| ())
    }

    pub async fn service_info(&self) -> Result<ServiceInfo, ApiError> {
        self.send_json::<(), _>(Method::GET, "/", None, None).await
    }

    // --- TRANSPORT ---

    fn build(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<Request<String>, ApiError> {
        let url = format!("{}/api{}", self.base, path);
        let mut builder = Request::builder()
            .method(method)
            .uri(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        builder
            .body(body.unwrap_or_default())
            .map_err(|_| ApiError::InvalidUrl(url))
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&B>,
        token: Option<&str>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = payload.map(serde_json::to_string).transpose()?;
        let req = self.build(method, path, body)?;
        let bytes = self.send(req, token).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Sends `req` (with a bearer token when given) and returns the body of a 2xx response.
    async fn send(&self, req: Request<String>, token: Option<&str>) -> Result<Bytes, ApiError> {
        let target = format!("{} {}", req.method(), req.uri().path());
        log::debug!("-> {}", target);

        let exchange = async {
            let response = match token {
                Some(token) => {
                    BearerAuthLayer::new(token)?
                        .layer(self.http.clone())
                        .oneshot(req)
                        .await
                }
                None => self.http.request(req).await,
            }
            .map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response
                .into_body()
                .collect()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
                .to_bytes();
            Ok::<_, ApiError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ApiError::Timeout)??;

        log::debug!("<- {} {}", status.as_u16(), target);
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::Status {
                status,
                detail: extract_detail(status, &body),
            })
        }
    }
}

fn collection_path<R: Resource>() -> String {
    format!("/{}", R::COLLECTION)
}

fn item_path<R: Resource>(id: &str) -> String {
    // Ids are opaque; escape anything that is not path-safe.
    let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("/{}/{}", R::COLLECTION, id)
}

/// `{"detail": "..."}` error bodies; validation errors carry a list and are skipped.
fn extract_detail(status: StatusCode, body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")?.as_str() {
        Some(detail) => Some(detail.to_string()),
        None => {
            log::debug!("{} response carried a structured detail", status.as_u16());
            None
        }
    }
}
