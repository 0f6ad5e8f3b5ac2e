// Bearer-token middleware for authenticated backend calls.
use crate::client::error::ApiError;
use http::{HeaderValue, Request, Response, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

#[derive(Clone, Debug)]
pub struct BearerAuthLayer {
    header: HeaderValue,
}

impl BearerAuthLayer {
    /// Fails when the token contains bytes that are not allowed in a header.
    pub fn new(token: &str) -> Result<Self, ApiError> {
        let mut header = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| ApiError::InvalidToken)?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuthService {
            inner,
            header: self.header.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BearerAuthService<S> {
    inner: S,
    header: HeaderValue,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for BearerAuthService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        req.headers_mut()
            .insert(http::header::AUTHORIZATION, self.header.clone());

        let target = format!("{} {}", req.method(), req.uri().path());
        let response = self.inner.call(req);

        Box::pin(async move {
            let response = response.await?;
            // The session layer decides what a rejected token means; just leave a trace.
            if response.status() == StatusCode::UNAUTHORIZED {
                log::warn!("Backend rejected bearer token on {}", target);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_inserts_authorization_header() {
        let echo = tower::service_fn(|req: Request<String>| async move {
            let auth = req
                .headers()
                .get(http::header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap_or_default().to_string())
                .unwrap_or_default();
            Ok::<_, Infallible>(Response::new(auth))
        });

        let svc = BearerAuthLayer::new("abc.def").unwrap().layer(echo);
        let response = svc.oneshot(Request::new(String::new())).await.unwrap();
        assert_eq!(response.into_body(), "Bearer abc.def");
    }

    #[test]
    fn test_rejects_header_breaking_tokens() {
        assert!(matches!(
            BearerAuthLayer::new("abc\r\nX-Evil: 1"),
            Err(ApiError::InvalidToken)
        ));
    }
}
