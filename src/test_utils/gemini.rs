use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::ScannerConfig;

/// Start a stand-in for the Gemini API that answers every request with `status` and `body`.
pub(crate) async fn fake_gemini(status: StatusCode, body: Value) -> ScannerConfig {
    let app = Router::new().route(
        "/v1beta/models/{model}",
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Could not bind fake Gemini server");
    let address = listener
        .local_addr()
        .expect("Could not get fake Gemini server address");
    tokio::spawn(async move { axum::serve(listener, app).await });

    ScannerConfig {
        base_url: format!("http://{address}"),
        model: "test-model".to_owned(),
        timeout: Duration::from_secs(5),
    }
}

/// A successful Gemini reply whose text is `text`.
pub(crate) fn gemini_text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }]
    })
}
