use crate::metrics::BalanceCollector;
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// HTTP endpoint serving the Prometheus scrape.
pub struct Server {
    collector: Arc<BalanceCollector>,
    listen_address: SocketAddr,
}

impl Server {
    pub fn new(collector: Arc<BalanceCollector>, listen_address: SocketAddr) -> Self {
        Server {
            collector,
            listen_address,
        }
    }

    pub fn router(collector: Arc<BalanceCollector>) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/metrics", get(metrics))
            .with_state(collector)
    }

    pub async fn start(&self) -> Result<()> {
        let app = Self::router(self.collector.clone());

        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        info!(listen = %self.listen_address, "Prometheus started");
        println!("📈 Prometheus exporter running on http://{}/metrics", self.listen_address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
        Ok(())
    }
}

/// Accepts `host:port` or the `:port` shorthand for all interfaces.
pub fn parse_listen_address(address: &str) -> Result<SocketAddr> {
    let address = address.trim();
    if address.is_empty() {
        return Err(anyhow::anyhow!("empty prometheus listener address"));
    }
    let full = if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    };
    full.parse::<SocketAddr>()
        .map_err(|e| anyhow::anyhow!("invalid prometheus listener address {:?}: {}", address, e))
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "tgrade-tools"
    }))
}

pub async fn metrics(State(collector): State<Arc<BalanceCollector>>) -> Response {
    match collector.render().await {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(cause = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_address() {
        assert_eq!(
            parse_listen_address(":8081").unwrap(),
            "0.0.0.0:8081".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            parse_listen_address("127.0.0.1:9100").unwrap(),
            "127.0.0.1:9100".parse::<SocketAddr>().unwrap()
        );
        assert!(parse_listen_address("").is_err());
        assert!(parse_listen_address("localhost").is_err());
    }
}
