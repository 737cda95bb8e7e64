//! Gemini API client for reading receipt photos.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{ScannerConfig, receipt::ScanError};

use super::error::ApiErrorResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client.
///
/// Cheap to clone, the underlying HTTP connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.inner.base_url)
            .field("model", &self.inner.model)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns [ScanError::Http] if the HTTP client could not be built.
    pub fn new(config: &ScannerConfig) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_owned(),
                model: config.model.clone(),
            }),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.inner.base_url, self.inner.model
        )
    }

    /// Send `prompt` together with an image and return the text of the reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API returns an error status, or the reply
    /// contains no text.
    #[instrument(skip(self, api_key, prompt, image), fields(model = %self.inner.model, image_bytes = image.len()))]
    pub async fn generate(
        &self,
        api_key: &SecretString,
        prompt: &str,
        mime_type: &str,
        image: &[u8],
    ) -> Result<String, ScanError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [
                    Part::Text { text: prompt },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type,
                            data: STANDARD.encode(image),
                        },
                    },
                ],
            }],
        };

        let response = self
            .inner
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.handle_error_status(status, response).await);
        }

        let body = response.text().await?;
        let reply: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ScanError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        tracing::debug!("Received {} candidate(s)", reply.candidates.len());

        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| ScanError::MalformedResponse("reply contained no text".to_owned()))
    }

    /// Handle an error status code.
    async fn handle_error_status(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> ScanError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return ScanError::RateLimited(retry_after);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return ScanError::Unauthorized(format!("API key rejected with status {status}"));
        }

        match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                // Gemini reports an invalid key as a 400.
                Ok(api_error) if api_error.error.message.contains("API key not valid") => {
                    ScanError::Unauthorized(api_error.error.message)
                }
                Ok(api_error) => ScanError::Api {
                    status: api_error.error.status,
                    message: api_error.error.message,
                },
                Err(_) => ScanError::Api {
                    status: "unknown".to_owned(),
                    message: body,
                },
            },
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tokio::net::TcpListener;

    use crate::{ScannerConfig, receipt::ScanError};

    use super::GeminiClient;

    #[derive(Clone, Default)]
    struct Captured {
        request: Arc<Mutex<Option<(HeaderMap, Value)>>>,
    }

    /// Start a stand-in for the Gemini API that answers every request with `reply`.
    async fn serve(reply: (StatusCode, HeaderMap, Value)) -> (ScannerConfig, Captured) {
        let captured = Captured::default();
        let handler = move |State(captured): State<Captured>,
                            headers: HeaderMap,
                            Json(body): Json<Value>| {
            let reply = reply.clone();
            async move {
                *captured.request.lock().unwrap() = Some((headers, body));
                let (status, headers, body) = reply;
                (status, headers, Json(body)).into_response()
            }
        };
        let app = Router::new()
            .route("/v1beta/models/{model}", post(handler))
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let config = ScannerConfig {
            base_url: format!("http://{address}"),
            model: "test-model".to_owned(),
            timeout: Duration::from_secs(5),
        };

        (config, captured)
    }

    fn text_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
    }

    async fn generate(config: &ScannerConfig) -> Result<String, ScanError> {
        GeminiClient::new(config)
            .unwrap()
            .generate(
                &SecretString::from("test-key".to_owned()),
                "read this",
                "image/png",
                b"not really a png",
            )
            .await
    }

    #[test]
    fn client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<GeminiClient>();
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GeminiClient>();
    }

    #[tokio::test]
    async fn returns_first_text_part() {
        let (config, _) = serve((StatusCode::OK, HeaderMap::new(), text_reply("{\"a\": 1}"))).await;

        let got = generate(&config).await;

        assert_eq!(got, Ok("{\"a\": 1}".to_owned()));
    }

    #[tokio::test]
    async fn sends_key_prompt_and_image() {
        let (config, captured) = serve((StatusCode::OK, HeaderMap::new(), text_reply("ok"))).await;

        generate(&config).await.unwrap();

        let (headers, body) = captured.request.lock().unwrap().take().unwrap();
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "read this");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "bm90IHJlYWxseSBhIHBuZw==");
    }

    #[tokio::test]
    async fn reply_without_text_is_malformed() {
        let (config, _) = serve((StatusCode::OK, HeaderMap::new(), json!({ "candidates": [] }))).await;

        let got = generate(&config).await;

        assert!(matches!(got, Err(ScanError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn rate_limit_uses_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", "17".parse().unwrap());
        let (config, _) = serve((StatusCode::TOO_MANY_REQUESTS, headers, json!({}))).await;

        let got = generate(&config).await;

        assert_eq!(got, Err(ScanError::RateLimited(17)));
    }

    #[tokio::test]
    async fn invalid_key_is_unauthorized() {
        let body = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        });
        let (config, _) = serve((StatusCode::BAD_REQUEST, HeaderMap::new(), body)).await;

        let got = generate(&config).await;

        assert!(matches!(got, Err(ScanError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn other_errors_keep_api_message() {
        let body = json!({
            "error": { "code": 500, "message": "Internal error", "status": "INTERNAL" }
        });
        let (config, _) = serve((StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), body)).await;

        let got = generate(&config).await;

        assert_eq!(
            got,
            Err(ScanError::Api {
                status: "INTERNAL".to_owned(),
                message: "Internal error".to_owned()
            })
        );
    }
}
