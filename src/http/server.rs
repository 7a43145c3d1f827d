//! HTTP listener and routing
//!
//! The listener accepts connections itself and serves each one on its own
//! task so that connection-level failures (including failed response writes)
//! can be forwarded to the error pipeline instead of being swallowed.

use axum::{extract::Request, routing::any, Router};
use hyper::{body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::{TcpListener, TcpStream};
use tower::Service;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, info_span, instrument, warn};

use crate::{
    http::handlers::{handle_reload, AppState},
    pipeline::ErrorReporter,
    types::Error,
};

/// Path of the single trigger endpoint
pub const RELOAD_PATH: &str = "/api/reload";

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Create the router serving the reload endpoint
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route(RELOAD_PATH, any(handle_reload))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(app_state)
}

/// Bind `address` and serve `router` until the process exits.
///
/// Bind and accept failures are reported to `errors`; a bind failure ends the
/// listener.
#[instrument(skip_all, fields(address = %address))]
pub async fn serve(address: String, router: Router, errors: ErrorReporter) {
    let listener = match TcpListener::bind(&address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Failed to bind to address");
            errors.report(Error::Bind { address, source: e });
            return;
        }
    };

    match listener.local_addr() {
        Ok(local_addr) => info!(local_addr = %local_addr, "HTTP server listening"),
        Err(_) => info!("HTTP server listening"),
    }

    accept_loop(listener, router, errors).await;
}

async fn accept_loop(listener: TcpListener, router: Router, errors: ErrorReporter) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let router = router.clone();
                let errors = errors.clone();
                tokio::spawn(serve_connection(stream, peer, router, errors));
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                errors.report(Error::Accept(e));
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    errors: ErrorReporter,
) {
    let service = service_fn(move |request: hyper::Request<Incoming>| {
        router.clone().call(request)
    });

    // Clients that shut down their write side after the request still get a response
    if let Err(e) = http1::Builder::new()
        .half_close(true)
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        debug!(peer = %peer, error = %e, "Connection ended with error");
        errors.report(Error::Connection { peer, source: e });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{http::auth::BearerAuth, pipeline, secrets::Secret};
    use anyhow::anyhow;
    use axum::{
        body::Body,
        http::{self as axum_http, header::AUTHORIZATION, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn test_router(
        succeed: bool,
        calls: Arc<AtomicUsize>,
    ) -> (Router, ErrorReporter, pipeline::ErrorConsumer) {
        let (errors, consumer) = pipeline::channel(8);
        let app_state = Arc::new(AppState {
            auth: BearerAuth::new(Secret::new("s3cr3t")),
            trigger: Arc::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
                if succeed {
                    Ok(())
                } else {
                    Err(anyhow!("reload failed"))
                }
            }),
            errors: errors.clone(),
        });
        (create_router(app_state), errors, consumer)
    }

    fn request(method: &str, uri: &str, authorization: Option<&str>) -> Request {
        let mut builder = axum_http::Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_router_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (router, _errors, _consumer) = test_router(true, calls.clone());

        let response = router
            .oneshot(request("POST", RELOAD_PATH, Some("Bearer s3cr3t")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_router_trigger_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (router, errors, _consumer) = test_router(false, calls.clone());

        let response = router
            .oneshot(request("POST", RELOAD_PATH, Some("Bearer s3cr3t")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, serde_json::json!({"error": "aa"}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // A failed action is reported to the client only
        assert_eq!(errors.dropped(), 0);
    }

    #[tokio::test]
    async fn test_router_method_not_allowed_regardless_of_headers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (router, _errors, _consumer) = test_router(true, calls.clone());

        for authorization in [None, Some("Bearer s3cr3t"), Some("Bearer wrong")] {
            for method in ["GET", "PUT", "DELETE", "HEAD"] {
                let response = router
                    .clone()
                    .oneshot(request(method, RELOAD_PATH, authorization))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_router_unauthorized() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (router, _errors, _consumer) = test_router(true, calls.clone());

        for authorization in [
            None,
            Some("Bearer wrong"),
            Some("Bearer "),
            Some("Basic czNjcjN0"),
            Some("s3cr3t"),
        ] {
            let response = router
                .clone()
                .oneshot(request("POST", RELOAD_PATH, authorization))
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "authorization {:?}",
                authorization
            );
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert!(body.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_router_unknown_path() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (router, _errors, _consumer) = test_router(true, calls.clone());

        let response = router
            .oneshot(request("POST", "/api/other", Some("Bearer s3cr3t")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_serve_reports_bind_failure() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = occupied.local_addr().unwrap().to_string();

        let calls = Arc::new(AtomicUsize::new(0));
        let (router, errors, consumer) = test_router(true, calls);

        // Returns once the bind fails, dropping the last reporter
        serve(address.clone(), router, errors).await;

        let received = tokio::task::spawn_blocking(move || {
            let mut received = Vec::new();
            consumer.run(|error| received.push(error));
            received
        })
        .await
        .unwrap();
        assert_eq!(received.len(), 1);
        match &received[0] {
            Error::Bind {
                address: failed, ..
            } => assert_eq!(failed, &address),
            other => panic!("Expected Bind error, got: {:?}", other),
        }
    }
}
