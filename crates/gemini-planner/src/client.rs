use async_trait::async_trait;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use stepwise_core::config::ProviderConfig;
use stepwise_core::{GeneratedPlan, HelpRequest, HelpSuggestion, ImageInput, PlanError, PlanProvider};
use tracing::debug;

use crate::error::GeminiError;
use crate::parse::parse_model_json;
use crate::prompt::{help_prompt, plan_prompt};
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, HelpPayload,
    InlineData, Part, PlanPayload,
};

/// Value shipped in sample env files; treated the same as no key at all.
pub const PLACEHOLDER_KEY: &str = "YOUR_GEMINI_API_KEY";

// ─── GeminiConfig ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    /// Model name (e.g. "gemini-2.5-flash").
    pub model: String,
    /// Base endpoint URL, without a trailing slash.
    pub endpoint: String,
    pub temperature: f32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::from_provider(&ProviderConfig::default())
    }
}

impl GeminiConfig {
    /// Build from the project config, reading the key from the environment.
    pub fn from_provider(cfg: &ProviderConfig) -> Self {
        Self {
            api_key: cfg.api_key(),
            model: cfg.model.clone(),
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            temperature: cfg.temperature,
        }
    }
}

// ─── GeminiClient ─────────────────────────────────────────────────────────

pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    fn api_key(&self) -> Result<&str, GeminiError> {
        match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_KEY => Ok(key),
            _ => Err(GeminiError::MissingApiKey),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// Send one user turn and return the model's text.
    ///
    /// Fails with [`GeminiError::MissingApiKey`] before touching the network
    /// when no usable key is configured.
    pub async fn complete(&self, parts: Vec<Part>) -> Result<String, GeminiError> {
        let key = self.api_key()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key_header = HeaderValue::from_str(key).map_err(|_| GeminiError::MissingApiKey)?;
        headers.insert("x-goog-api-key", key_header);

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                response_mime_type: "application/json".to_string(),
            },
        };

        debug!(model = %self.config.model, "sending generateContent request");
        let response = self
            .http
            .post(self.url())
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|source| GeminiError::Parse {
                text: text.clone(),
                source,
            })?;
        if let Some(error) = parsed.error {
            return Err(GeminiError::Api(error));
        }
        parsed.text().ok_or(GeminiError::EmptyResponse)
    }

    pub async fn generate_plan(
        &self,
        description: &str,
        image: Option<&ImageInput>,
    ) -> Result<GeneratedPlan, GeminiError> {
        let mut parts = vec![Part::Text {
            text: plan_prompt(description, image.is_some()),
        }];
        if let Some(image) = image {
            parts.push(Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&image.bytes),
                },
            });
        }
        let text = self.complete(parts).await?;
        let payload: PlanPayload = parse_model_json(&text)?;
        Ok(payload.into())
    }

    pub async fn suggest(&self, request: &HelpRequest) -> Result<HelpSuggestion, GeminiError> {
        let parts = vec![Part::Text {
            text: help_prompt(request),
        }];
        let text = self.complete(parts).await?;
        let payload: HelpPayload = parse_model_json(&text)?;
        Ok(payload.into())
    }
}

#[async_trait]
impl PlanProvider for GeminiClient {
    async fn generate(
        &self,
        description: &str,
        image: Option<&ImageInput>,
    ) -> Result<GeneratedPlan, PlanError> {
        Ok(self.generate_plan(description, image).await?)
    }

    async fn help(&self, request: &HelpRequest) -> Result<HelpSuggestion, PlanError> {
        Ok(self.suggest(request).await?)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use stepwise_core::Step;

    const PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn client(endpoint: &str, key: Option<&str>) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: key.map(str::to_string),
            model: "gemini-2.5-flash".to_string(),
            endpoint: endpoint.to_string(),
            temperature: 0.4,
        })
        .unwrap()
    }

    fn envelope(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
        .to_string()
    }

    fn help_request() -> HelpRequest {
        HelpRequest {
            task_title: "Boil an egg".into(),
            completed_steps: vec![],
            pending_steps: vec![Step::new(1, "Fill pot")],
            issue: "No pot".into(),
        }
    }

    #[tokio::test]
    async fn generates_plan_from_fenced_response() {
        let mut server = mockito::Server::new_async().await;
        let model_text = "```json\n{\"taskTitle\":\"Boil an egg\",\"steps\":[{\"id\":1,\"text\":\"Fill pot\",\"completed\":false,\"note\":\"\"},{\"id\":2,\"text\":\"Boil water\",\"completed\":false,\"note\":\"\"}]}\n```";
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::Regex("Boil an egg".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope(model_text))
            .create_async()
            .await;

        let plan = client(&server.url(), Some("test-key"))
            .generate_plan("Boil an egg", None)
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(plan.task_title, "Boil an egg");
        assert_eq!(plan.steps, vec![Step::new(1, "Fill pot"), Step::new(2, "Boil water")]);
    }

    #[tokio::test]
    async fn image_is_sent_inline() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#""inlineData""#.into()),
                Matcher::Regex(r#""mimeType":"image/png""#.into()),
                Matcher::Regex(r#""data":"AQID""#.into()),
            ]))
            .with_status(200)
            .with_body(envelope(r#"{"taskTitle":"Fix bike","steps":[{"text":"Flip bike"}]}"#))
            .create_async()
            .await;

        let image = ImageInput::new(vec![1, 2, 3], "image/png");
        let plan = client(&server.url(), Some("k"))
            .generate_plan("", Some(&image))
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(plan.steps.len(), 1);
    }

    #[tokio::test]
    async fn missing_or_placeholder_key_never_calls_out() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", PATH).expect(0).create_async().await;

        for key in [None, Some(""), Some(PLACEHOLDER_KEY)] {
            let err = client(&server.url(), key)
                .generate("Boil an egg", None)
                .await
                .unwrap_err();
            assert_eq!(err, PlanError::ProviderUnconfigured);
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let err = client(&server.url(), Some("k"))
            .help(&help_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::PlanUnavailable(m) if m.contains("503")));
    }

    #[tokio::test]
    async fn api_error_object_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"error": {"code": 429, "message": "quota exceeded"}}"#)
            .create_async()
            .await;

        let err = client(&server.url(), Some("k"))
            .generate("Boil an egg", None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, PlanError::PlanUnavailable(m) if m.contains("quota exceeded (code 429)"))
        );
    }

    #[tokio::test]
    async fn prose_answer_is_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(envelope("Here are some steps: first, fill a pot."))
            .create_async()
            .await;

        let err = client(&server.url(), Some("k"))
            .generate("Boil an egg", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::PlanFormatError(_)));
    }

    #[tokio::test]
    async fn empty_candidates_is_format_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = client(&server.url(), Some("k"))
            .help(&help_request())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::PlanFormatError(_)));
    }

    #[tokio::test]
    async fn help_returns_message_and_replacement() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .match_body(Matcher::Regex("No pot".into()))
            .with_status(200)
            .with_body(envelope(
                r#"{"message":"Use a deep pan","suggestedSolution":[{"id":1,"text":"Fill pan","completed":false}]}"#,
            ))
            .create_async()
            .await;

        let s = client(&server.url(), Some("k"))
            .help(&help_request())
            .await
            .unwrap();
        assert_eq!(s.message, "Use a deep pan");
        assert_eq!(s.suggested_solution, vec![Step::new(1, "Fill pan")]);
    }

    #[test]
    fn url_targets_model() {
        let c = client("https://example.test/v1beta", Some("k"));
        assert_eq!(
            c.url(),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
