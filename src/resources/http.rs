//! HTTP dependency probed with a GET against its health path.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

pub struct HttpDependency {
    name: String,
    uri: String,
    client: Client<HttpConnector, Body>,
}

impl HttpDependency {
    pub fn new(name: impl Into<String>, address: &str, path: &str) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());

        Self {
            name: name.into(),
            uri: format!("http://{}{}", address, path),
            client,
        }
    }
}

#[async_trait]
impl ManagedResource for HttpDependency {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> ProbeOutcome {
        let request = match Request::builder()
            .method("GET")
            .uri(&self.uri)
            .header("user-agent", "service-lifecycle-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => return ProbeOutcome::unhealthy(format!("invalid probe request: {}", e)),
        };

        match self.client.request(request).await {
            Ok(response) if response.status().is_success() => ProbeOutcome::healthy(),
            Ok(response) => ProbeOutcome::unhealthy(format!(
                "{} returned {}",
                self.uri,
                response.status()
            )),
            Err(e) => ProbeOutcome::unhealthy(format!("{}: {}", self.uri, e)),
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        // Connections are not pooled, so nothing stays open between probes.
        ReleaseOutcome::Closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use tokio::net::TcpListener;

    async fn serve(status: StatusCode) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let app = Router::new().route("/health", get(move || async move { status }));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        address
    }

    #[tokio::test]
    async fn success_status_is_healthy() {
        let address = serve(StatusCode::OK).await;
        let dep = HttpDependency::new("search", &address, "/health");
        assert!(dep.probe().await.is_healthy());
    }

    #[tokio::test]
    async fn error_status_is_unhealthy() {
        let address = serve(StatusCode::SERVICE_UNAVAILABLE).await;
        let dep = HttpDependency::new("search", &address, "/health");

        let outcome = dep.probe().await;
        assert!(!outcome.is_healthy());
        assert_eq!(dep.release().await, ReleaseOutcome::Closed);
    }
}
