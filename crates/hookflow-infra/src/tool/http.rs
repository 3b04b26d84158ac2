//! HTTP tool backend.
//!
//! Sends the configured request with reqwest. Without a configured body
//! template, the input travels as a JSON body for POST/PUT/PATCH and as query
//! parameters for every other method.

use std::time::Duration;

use reqwest::Method;
use serde_json::{Map, Value};

use hookflow_core::tool::backend::{BackendFuture, ToolBackend};
use hookflow_core::tool::template::{render, render_json};
use hookflow_types::error::ToolError;
use hookflow_types::tool::HttpToolConfig;

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_EXCERPT: usize = 512;

#[derive(Debug, Clone)]
pub struct HttpToolBackend {
    client: reqwest::Client,
}

impl HttpToolBackend {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(
        &self,
        config: &HttpToolConfig,
        input: &Value,
        budget: Duration,
    ) -> Result<reqwest::RequestBuilder, ToolError> {
        let method = Method::from_bytes(config.method.to_uppercase().as_bytes())
            .map_err(|_| ToolError::InvalidConfig(format!("invalid HTTP method '{}'", config.method)))?;
        let fields = input.as_object().cloned().unwrap_or_default();

        let mut request = self.client.request(method.clone(), &config.url).timeout(budget);
        for (name, value) in &config.headers {
            request = request.header(name, render(value, &fields));
        }

        request = match &config.body {
            Some(template) => {
                let content_type = config
                    .headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                    .map(|(_, v)| v.to_ascii_lowercase());
                match content_type {
                    None => request
                        .header(reqwest::header::CONTENT_TYPE, "application/json")
                        .body(render_json(template, &fields)),
                    Some(ct) if ct.contains("json") => request.body(render_json(template, &fields)),
                    Some(_) => request.body(render(template, &fields)),
                }
            }
            None if method == Method::POST || method == Method::PUT || method == Method::PATCH => {
                request.json(input)
            }
            None => request.query(&query_pairs(&fields)),
        };

        Ok(request)
    }
}

fn query_pairs(fields: &Map<String, Value>) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

fn transport_error(e: reqwest::Error, budget: Duration) -> ToolError {
    if e.is_timeout() {
        ToolError::Timeout(budget)
    } else {
        ToolError::External(format!("request failed: {e}"))
    }
}

impl ToolBackend<HttpToolConfig> for HttpToolBackend {
    fn execute<'a>(
        &'a self,
        config: &'a HttpToolConfig,
        input: &'a Value,
        budget: Duration,
    ) -> BackendFuture<'a, Value> {
        Box::pin(async move {
            let request = self.build_request(config, input, budget)?;
            let response = request.send().await.map_err(|e| transport_error(e, budget))?;

            let status = response.status();
            let text = response.text().await.map_err(|e| transport_error(e, budget))?;

            if !status.is_success() {
                let excerpt: String = text.chars().take(ERROR_BODY_EXCERPT).collect();
                tracing::debug!(url = %config.url, status = status.as_u16(), "HTTP tool got error status");
                return Err(ToolError::External(format!("HTTP {}: {}", status.as_u16(), excerpt)));
            }

            Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve() -> String {
        let app = Router::new()
            .route("/ok", get(|| async { Json(json!({"a": 1})) }))
            .route("/text", get(|| async { "plain text" }))
            .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
            .route(
                "/raw",
                post(|headers: HeaderMap, body: String| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({"body": body, "content_type": content_type}))
                }),
            )
            .route(
                "/query",
                get(|Query(q): Query<HashMap<String, String>>| async move { Json(q) }),
            )
            .route(
                "/headers",
                get(|headers: HeaderMap| async move {
                    let token = headers
                        .get("x-token")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    Json(json!({"token": token}))
                }),
            )
            .route("/fail", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "kaput") }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(method: &str, url: String) -> HttpToolConfig {
        HttpToolConfig {
            method: method.to_string(),
            url,
            headers: HashMap::new(),
            body: None,
            timeout: Some(5),
        }
    }

    fn backend() -> HttpToolBackend {
        HttpToolBackend::new(reqwest::Client::new())
    }

    const BUDGET: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_get_json_response() {
        let base = serve().await;
        let output = backend()
            .execute(&config("GET", format!("{base}/ok")), &json!({}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_non_json_response_becomes_string() {
        let base = serve().await;
        let output = backend()
            .execute(&config("GET", format!("{base}/text")), &json!({}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!("plain text"));
    }

    #[tokio::test]
    async fn test_post_sends_input_as_json() {
        let base = serve().await;
        let output = backend()
            .execute(&config("post", format!("{base}/echo")), &json!({"order_id": 7}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"order_id": 7}));
    }

    #[tokio::test]
    async fn test_get_sends_input_as_query() {
        let base = serve().await;
        let output = backend()
            .execute(&config("GET", format!("{base}/query")), &json!({"q": "rust", "page": 2}), BUDGET)
            .await
            .unwrap();
        assert_eq!(output, json!({"q": "rust", "page": "2"}));
    }

    #[tokio::test]
    async fn test_body_template_and_headers_rendered() {
        let base = serve().await;
        let mut cfg = config("POST", format!("{base}/raw"));
        cfg.body = Some(r#"{"greeting": "hi {{name}}"}"#.to_string());
        let output = backend().execute(&cfg, &json!({"name": "Ada"}), BUDGET).await.unwrap();
        assert_eq!(output["body"], json!(r#"{"greeting": "hi Ada"}"#));
        assert_eq!(output["content_type"], json!("application/json"));

        let mut cfg = config("POST", format!("{base}/raw"));
        cfg.body = Some(r#"{"note": "{{note}}"}"#.to_string());
        let output = backend().execute(&cfg, &json!({"note": "say \"hi\""}), BUDGET).await.unwrap();
        let sent: Value = serde_json::from_str(output["body"].as_str().unwrap()).unwrap();
        assert_eq!(sent, json!({"note": "say \"hi\""}));

        let mut cfg = config("POST", format!("{base}/raw"));
        cfg.headers.insert("Content-Type".to_string(), "text/plain".to_string());
        cfg.body = Some("note={{note}}".to_string());
        let output = backend().execute(&cfg, &json!({"note": "a\"b"}), BUDGET).await.unwrap();
        assert_eq!(output["body"], json!("note=a\"b"));
        assert_eq!(output["content_type"], json!("text/plain"));

        let mut cfg = config("GET", format!("{base}/headers"));
        cfg.headers.insert("X-Token".to_string(), "tok-{{user}}".to_string());
        let output = backend().execute(&cfg, &json!({"user": "7"}), BUDGET).await.unwrap();
        assert_eq!(output["token"], json!("tok-7"));
    }

    #[tokio::test]
    async fn test_error_status_is_external() {
        let base = serve().await;
        let err = backend()
            .execute(&config("GET", format!("{base}/fail")), &json!({}), BUDGET)
            .await
            .unwrap_err();
        match err {
            ToolError::External(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("kaput"));
            }
            other => panic!("expected External, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_target_times_out() {
        let base = serve().await;
        let err = backend()
            .execute(&config("GET", format!("{base}/slow")), &json!({}), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_target_is_external() {
        let err = backend()
            .execute(&config("GET", "http://127.0.0.1:9/nothing".to_string()), &json!({}), BUDGET)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::External(_)));
    }
}
