//! Liveness endpoint for supervisors and uptime probes.
//!
//! The server shares no state with the billing session; it only reports
//! that the process is up.
use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{Json, Router, routing::get};
use roomtab_core::config::Config;
use serde_json::{Value, json};
use tracing::info;

/// Executes the serve command.
pub async fn execute(port: Option<u16>, config: &Config) -> Result<()> {
    let port = resolve_port(port, config);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{}", addr);

    axum::serve(listener, router())
        .await
        .context("Server error")?;
    Ok(())
}

fn router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Port precedence: flag, config file, PORT environment variable, 8080.
fn resolve_port(flag: Option<u16>, config: &Config) -> u16 {
    flag.or(config.serve.port)
        .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(8080)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use roomtab_core::config::ServeConfig;
    use std::env;
    use std::sync::Mutex;
    use tower::ServiceExt;

    // Mutex to serialize tests that modify the environment
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[tokio::test]
    async fn test_health_route() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = router()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_port_flag_wins() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = Config {
            serve: ServeConfig { port: Some(9000) },
            ..Default::default()
        };
        assert_eq!(resolve_port(Some(9999), &config), 9999);
    }

    #[test]
    fn test_resolve_port_from_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let config = Config {
            serve: ServeConfig { port: Some(9000) },
            ..Default::default()
        };
        assert_eq!(resolve_port(None, &config), 9000);
    }

    #[test]
    fn test_resolve_port_from_env_then_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        unsafe {
            env::set_var("PORT", "7070");
        }
        assert_eq!(resolve_port(None, &Config::default()), 7070);

        unsafe {
            env::remove_var("PORT");
        }
        assert_eq!(resolve_port(None, &Config::default()), 8080);
    }
}
