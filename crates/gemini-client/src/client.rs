use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ListModelsResponse, ModelInfo,
};
use crate::{GeminiError, Result};

/// Public Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_ATTEMPTS: u32 = 3;

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    retry_base: Duration,
}

impl GeminiClient {
    /// Create a client for `api_key`. `base_url` defaults to [`DEFAULT_BASE_URL`].
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retry_base: Duration::from_millis(500),
        })
    }

    /// Override the first backoff delay (doubled on each retry).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base = delay;
        self
    }

    /// Generate a single completion and return its text.
    pub async fn generate(
        &self,
        model: &str,
        system_instruction: Option<&str>,
        prompt: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            system_instruction: system_instruction.map(Content::system),
            contents: vec![Content::user(prompt)],
            generation_config: Some(GenerationConfig::default()),
        };
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);

        let response: GenerateContentResponse = self
            .with_retries(|| async {
                let resp = self
                    .http
                    .post(&url)
                    .header(API_KEY_HEADER, &self.api_key)
                    .json(&request)
                    .send()
                    .await?;
                decode(resp).await
            })
            .await?;

        response.text().ok_or(GeminiError::EmptyResponse)
    }

    /// List every model visible to the API key, following pagination.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/v1beta/models", self.base_url);
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let token = page_token.clone();
            let page: ListModelsResponse = self
                .with_retries(|| async {
                    let mut req = self.http.get(&url).header(API_KEY_HEADER, &self.api_key);
                    if let Some(t) = &token {
                        req = req.query(&[("pageToken", t.as_str())]);
                    }
                    decode(req.send().await?).await
                })
                .await?;

            models.extend(page.models);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(models)
    }

    async fn with_retries<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                    let delay = self.retry_base * 2u32.pow(attempt);
                    tracing::debug!(attempt = attempt + 1, error = %e, "retrying Gemini request");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(GeminiError::Api {
            status: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|source| GeminiError::Parse { body, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> GeminiClient {
        GeminiClient::new("test-key", Some(server.url()))
            .unwrap()
            .with_retry_delay(Duration::ZERO)
    }

    const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiClient::new("  ", None),
            Err(GeminiError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header(API_KEY_HEADER, "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "judge me"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"You are weak."}]}}]}"#)
            .create_async()
            .await;

        let text = client(&server)
            .generate("gemini-2.0-flash", Some("be cruel"), "judge me")
            .await
            .unwrap();

        assert_eq!(text, "You are weak.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", GENERATE_PATH)
            .with_status(503)
            .with_body("overloaded")
            .expect(MAX_ATTEMPTS as usize)
            .create_async()
            .await;

        let err = client(&server)
            .generate("gemini-2.0-flash", None, "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::Api { status: 503, .. }));
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn generate_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .with_status(400)
            .with_body("bad key")
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .generate("gemini-2.0-flash", None, "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, GeminiError::Api { status: 400, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn generate_without_text_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", GENERATE_PATH)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .generate("gemini-2.0-flash", None, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
    }

    #[tokio::test]
    async fn list_models_returns_single_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1beta/models")
            .match_header(API_KEY_HEADER, "test-key")
            .with_status(200)
            .with_body(
                r#"{"models":[
                    {"name":"models/embedding-001"},
                    {"name":"models/gemini-2.0-flash","supportedGenerationMethods":["generateContent"]}
                ]}"#,
            )
            .create_async()
            .await;

        let models = client(&server).list_models().await.unwrap();

        let ids: Vec<&str> = models.iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["embedding-001", "gemini-2.0-flash"]);
        assert!(!models[0].supports_generate());
        assert!(models[1].supports_generate());
        mock.assert_async().await;
    }
}
