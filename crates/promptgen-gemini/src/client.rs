//! Gemini API client.

use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use promptgen_models::{
    AspectRatio, ConsistencyResult, ImageData, ImageModel, LanguageCode, SpeechVoice,
    StoryboardScene, VideoModel,
};

use crate::error::{GeminiError, GeminiResult};
use crate::prompts;
use crate::types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageParameters, Part,
    PredictImageRequest, PredictImageResponse, PredictVideoRequest, PromptInstance, SpeechConfig,
    VideoOperation, VideoParameters,
};

/// Text models tried in order until one succeeds.
const TEXT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Image model id for the flash-image ("nano banana") path.
const FLASH_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Veo model id for video generation.
const VEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// TTS model id for speech synthesis.
const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Interval between Veo operation polls.
const VIDEO_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Create a client from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> GeminiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| GeminiError::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    // =========================================================================
    // Prompt generation
    // =========================================================================

    /// Generate a video prompt from an influencer image plus product images.
    pub async fn generate_video_prompt(
        &self,
        influencer: &ImageData,
        products: &[ImageData],
        language: LanguageCode,
    ) -> GeminiResult<String> {
        let mut parts = vec![Part::image(influencer)];
        parts.extend(products.iter().map(Part::image));
        parts.push(Part::text(prompts::video_prompt_template(language)));

        self.generate_text(GenerateContentRequest::new(parts)).await
    }

    /// Generate a product advertisement prompt from product images.
    pub async fn generate_product_ad_prompt(
        &self,
        products: &[ImageData],
        language: LanguageCode,
    ) -> GeminiResult<String> {
        let mut parts: Vec<Part> = products.iter().map(Part::image).collect();
        parts.push(Part::text(prompts::product_ad_template(language)));

        self.generate_text(GenerateContentRequest::new(parts)).await
    }

    /// Generate an influencer-only prompt from an image and an action brief.
    pub async fn generate_influencer_prompt(
        &self,
        influencer: &ImageData,
        actions: &str,
        language: LanguageCode,
    ) -> GeminiResult<String> {
        let parts = vec![
            Part::image(influencer),
            Part::text(prompts::influencer_only_template(actions, language)),
        ];

        self.generate_text(GenerateContentRequest::new(parts)).await
    }

    /// Audit a generated prompt for visual-consistency ambiguities.
    pub async fn check_consistency(&self, prompt: &str) -> GeminiResult<ConsistencyResult> {
        let request = GenerateContentRequest::new(vec![Part::text(format!(
            "Audit this prompt:\n\n---\n\n{prompt}"
        ))])
        .with_system_instruction(prompts::CONSISTENCY_SYSTEM_INSTRUCTION)
        .with_config(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(prompts::consistency_schema()),
            ..Default::default()
        });

        let text = self.generate_text(request).await?;
        let json = strip_markdown_fences(&text);
        serde_json::from_str(json).map_err(|e| {
            GeminiError::invalid_response(format!("consistency verdict is not valid JSON: {}", e))
        })
    }

    /// Generate a storyboard from a premise.
    pub async fn generate_storyboard(&self, premise: &str) -> GeminiResult<Vec<StoryboardScene>> {
        let request =
            GenerateContentRequest::new(vec![Part::text(prompts::storyboard_prompt(premise))])
                .with_config(GenerationConfig {
                    response_mime_type: Some("application/json".to_string()),
                    response_schema: Some(prompts::storyboard_schema()),
                    ..Default::default()
                });

        let text = self.generate_text(request).await?;
        let json = strip_markdown_fences(&text);
        serde_json::from_str(json).map_err(|e| {
            GeminiError::invalid_response(format!("storyboard is not valid JSON: {}", e))
        })
    }

    // =========================================================================
    // Image generation
    // =========================================================================

    /// Generate one or more images, returning data URLs.
    pub async fn generate_image(
        &self,
        prompt: &str,
        number_of_images: u32,
        model: ImageModel,
    ) -> GeminiResult<Vec<String>> {
        match model {
            ImageModel::Imagen4 => self.generate_imagen(prompt, number_of_images).await,
            ImageModel::NanoBanana => self.generate_flash_image(prompt).await,
            ImageModel::GrokImagine => Err(GeminiError::unsupported(
                "Grok Imagine model is not yet integrated.",
            )),
        }
    }

    async fn generate_imagen(&self, prompt: &str, count: u32) -> GeminiResult<Vec<String>> {
        let url = format!(
            "{}/models/imagen-4.0-generate-001:predict?key={}",
            self.base_url, self.api_key
        );
        let request = PredictImageRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_string(),
            }],
            parameters: ImageParameters {
                sample_count: count,
                aspect_ratio: AspectRatio::Square.as_str().to_string(),
                output_mime_type: "image/jpeg".to_string(),
            },
        };

        let response: PredictImageResponse = self.post_json(&url, &request).await?;

        let images: Vec<String> = response
            .predictions
            .into_iter()
            .filter_map(|p| p.bytes_base64_encoded)
            .map(|bytes| format!("data:image/jpeg;base64,{}", bytes))
            .collect();

        if images.is_empty() {
            return Err(GeminiError::invalid_response(
                "No images were generated by the API.",
            ));
        }
        Ok(images)
    }

    async fn generate_flash_image(&self, prompt: &str) -> GeminiResult<Vec<String>> {
        let request = GenerateContentRequest::new(vec![Part::text(prompt)]).with_config(
            GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            },
        );

        let response = self.generate_content(FLASH_IMAGE_MODEL, &request).await?;

        for candidate in &response.candidates {
            for part in &candidate.content.parts {
                if let Some(inline) = &part.inline_data {
                    return Ok(vec![format!("data:image/png;base64,{}", inline.data)]);
                }
            }
        }
        Err(GeminiError::invalid_response(
            "Image model did not return an image.",
        ))
    }

    // =========================================================================
    // Video generation
    // =========================================================================

    /// Generate a video and return its download URI.
    ///
    /// Starts a long-running Veo operation and polls it every 10 seconds
    /// until completion. Only the Veo model is supported.
    pub async fn generate_video(&self, prompt: &str, model: VideoModel) -> GeminiResult<String> {
        if model != VideoModel::GeminiVeo {
            return Err(GeminiError::unsupported(format!(
                "Model '{}' is not supported for video generation yet.",
                model.as_str()
            )));
        }

        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            self.base_url, VEO_MODEL, self.api_key
        );
        let request = PredictVideoRequest {
            instances: vec![PromptInstance {
                prompt: prompt.to_string(),
            }],
            parameters: VideoParameters {
                sample_count: 1,
                aspect_ratio: AspectRatio::Portrait.as_str().to_string(),
                resolution: "720p".to_string(),
            },
        };

        let mut operation: VideoOperation = self.post_json(&url, &request).await?;
        info!(operation = %operation.name, "Started video generation");

        while !operation.done {
            tokio::time::sleep(VIDEO_POLL_INTERVAL).await;
            operation = self.get_operation(&operation.name).await?;
        }

        if let Some(error) = operation.error {
            return Err(GeminiError::invalid_response(format!(
                "Video generation failed: {}",
                error.message.unwrap_or_else(|| "unknown error".to_string())
            )));
        }

        operation
            .response
            .as_ref()
            .and_then(|r| r.first_video_uri())
            .map(|uri| uri.to_string())
            .ok_or_else(|| {
                GeminiError::invalid_response(
                    "Video generation completed, but no download link was found.",
                )
            })
    }

    async fn get_operation(&self, name: &str) -> GeminiResult<VideoOperation> {
        let url = format!("{}/{}?key={}", self.base_url, name, self.api_key);
        let response = self.http.get(&url).send().await?;
        Self::check_status(response).await?.json().await.map_err(Into::into)
    }

    // =========================================================================
    // Speech generation
    // =========================================================================

    /// Synthesize speech, returning base64-encoded PCM audio.
    pub async fn generate_speech(&self, text: &str, voice: SpeechVoice) -> GeminiResult<String> {
        let request = GenerateContentRequest::new(vec![Part::text(text)]).with_config(
            GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig::voice(voice.api_name())),
                ..Default::default()
            },
        );

        let response = self.generate_content(TTS_MODEL, &request).await?;

        response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.inline_data.as_ref())
            .map(|inline| inline.data.clone())
            .ok_or_else(|| GeminiError::invalid_response("TTS model did not return audio."))
    }

    // =========================================================================
    // Core request plumbing
    // =========================================================================

    /// Run a text request against the model fallback chain.
    async fn generate_text(&self, request: GenerateContentRequest) -> GeminiResult<String> {
        let mut last_error = None;

        for model in TEXT_MODELS {
            match self.generate_content(model, &request).await {
                Ok(response) => match Self::first_text(&response) {
                    Some(text) => return Ok(text),
                    None => {
                        last_error =
                            Some(GeminiError::invalid_response("No content in response"));
                    }
                },
                Err(e) => {
                    warn!(model, "Gemini request failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GeminiError::invalid_response("All Gemini models failed")))
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        self.post_json(&url, request).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> GeminiResult<T> {
        let response = self.http.post(url).json(body).send().await?;
        Self::check_status(response).await?.json().await.map_err(Into::into)
    }

    async fn check_status(response: reqwest::Response) -> GeminiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("Requested entity was not found") {
            return Err(GeminiError::InvalidApiKey);
        }
        Err(GeminiError::Api {
            status: status.as_u16(),
            body,
        })
    }

    fn first_text(response: &GenerateContentResponse) -> Option<String> {
        response
            .candidates
            .first()
            .and_then(|c| c.content.parts.iter().find_map(|p| p.text.clone()))
    }
}

/// Strip a ```json fence if the model wrapped its JSON in markdown.
fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markdown_fences() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(
            strip_markdown_fences("```json\n{\"a\":1}\n```"),
            "{\"a\":1}"
        );
        assert_eq!(strip_markdown_fences("```\n[1,2]\n```"), "[1,2]");
    }

    #[tokio::test]
    async fn test_unsupported_video_model() {
        let client = GeminiClient::new("test-key");
        let err = client
            .generate_video("a prompt", VideoModel::OpenAiSora)
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_grok_imagine_not_integrated() {
        let client = GeminiClient::new("test-key");
        let err = client
            .generate_image("a prompt", 1, ImageModel::GrokImagine)
            .await
            .unwrap_err();
        assert!(matches!(err, GeminiError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_text_generation_falls_back_across_models() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{ "content": { "parts": [{ "text": "fallback output" }] } }]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new("test-key").with_base_url(server.uri());
        let image = promptgen_models::ImageData {
            base64: "aGk=".to_string(),
            mime_type: "image/png".to_string(),
        };

        let prompt = client
            .generate_product_ad_prompt(&[image], promptgen_models::LanguageCode::En)
            .await
            .unwrap();
        assert_eq!(prompt, "fallback output");
    }
}
