//! Credit-gated generation service.
//!
//! Every operation follows the same contract: validate inputs, spend the
//! fixed credit cost optimistically, then call the generation backend.
//! A remote failure after the spend does NOT refund the credits; the error
//! message is the user-visible outcome. The consistency audit is the one
//! free operation.

use std::sync::Arc;

use tracing::debug;

use promptgen_gemini::GeminiClient;
use promptgen_models::{
    ConsistencyResult, GenerationKind, ImageData, ImageModel, LanguageCode, SpeechVoice,
    StoryboardScene, VideoModel, MAX_SPEECH_CHARACTERS,
};

use crate::error::{ApiError, ApiResult};
use crate::services::session::SessionStore;

/// Outcome of a charged generation call.
#[derive(Debug)]
pub struct Generated<T> {
    pub output: T,
    /// Balance after the spend.
    pub credits: u32,
}

/// Service wrapping the Gemini client with credit gating.
pub struct GenerationService {
    sessions: Arc<SessionStore>,
    /// Fixed client for tests; production resolves one per call from env.
    client_override: Option<Arc<GeminiClient>>,
}

impl GenerationService {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            client_override: None,
        }
    }

    /// Use a fixed client instead of resolving from the environment.
    pub fn with_client(sessions: Arc<SessionStore>, client: Arc<GeminiClient>) -> Self {
        Self {
            sessions,
            client_override: Some(client),
        }
    }

    fn client(&self) -> ApiResult<Arc<GeminiClient>> {
        match &self.client_override {
            Some(client) => Ok(Arc::clone(client)),
            None => Ok(Arc::new(GeminiClient::from_env()?)),
        }
    }

    /// Spend the operation's fixed cost; returns the balance after.
    async fn charge(&self, user_id: &str, kind: GenerationKind) -> ApiResult<u32> {
        let cost = kind.credit_cost();
        let credits = self.sessions.spend_credits(user_id, cost).await?;
        debug!(user_id, kind = kind.as_str(), cost, credits, "Charged generation");
        Ok(credits)
    }

    pub async fn video_prompt(
        &self,
        user_id: &str,
        influencer: &ImageData,
        products: &[ImageData],
        language: LanguageCode,
    ) -> ApiResult<Generated<String>> {
        if products.is_empty() {
            return Err(ApiError::bad_request("At least one product image is required"));
        }
        let credits = self.charge(user_id, GenerationKind::VideoPrompt).await?;
        let output = self
            .client()?
            .generate_video_prompt(influencer, products, language)
            .await?;
        Ok(Generated { output, credits })
    }

    pub async fn product_ad_prompt(
        &self,
        user_id: &str,
        products: &[ImageData],
        language: LanguageCode,
    ) -> ApiResult<Generated<String>> {
        if products.is_empty() {
            return Err(ApiError::bad_request("At least one product image is required"));
        }
        let credits = self.charge(user_id, GenerationKind::ProductAdPrompt).await?;
        let output = self
            .client()?
            .generate_product_ad_prompt(products, language)
            .await?;
        Ok(Generated { output, credits })
    }

    pub async fn influencer_prompt(
        &self,
        user_id: &str,
        influencer: &ImageData,
        actions: &str,
        language: LanguageCode,
    ) -> ApiResult<Generated<String>> {
        if actions.trim().is_empty() {
            return Err(ApiError::bad_request("A description of the actions is required"));
        }
        let credits = self.charge(user_id, GenerationKind::InfluencerPrompt).await?;
        let output = self
            .client()?
            .generate_influencer_prompt(influencer, actions, language)
            .await?;
        Ok(Generated { output, credits })
    }

    /// Audit a prompt for consistency. Free of charge.
    pub async fn check_consistency(&self, prompt: &str) -> ApiResult<ConsistencyResult> {
        Ok(self.client()?.check_consistency(prompt).await?)
    }

    pub async fn image(
        &self,
        user_id: &str,
        prompt: &str,
        number_of_images: u32,
        model: ImageModel,
    ) -> ApiResult<Generated<Vec<String>>> {
        if prompt.trim().is_empty() {
            return Err(ApiError::bad_request("A prompt is required"));
        }
        let credits = self.charge(user_id, GenerationKind::Image).await?;
        let output = self
            .client()?
            .generate_image(prompt, number_of_images.clamp(1, 4), model)
            .await?;
        Ok(Generated { output, credits })
    }

    pub async fn video(
        &self,
        user_id: &str,
        prompt: &str,
        model: VideoModel,
    ) -> ApiResult<Generated<String>> {
        if prompt.trim().is_empty() {
            return Err(ApiError::bad_request("A prompt is required"));
        }
        let credits = self.charge(user_id, GenerationKind::Video).await?;
        let output = self.client()?.generate_video(prompt, model).await?;
        Ok(Generated { output, credits })
    }

    pub async fn speech(
        &self,
        user_id: &str,
        text: &str,
        voice: SpeechVoice,
    ) -> ApiResult<Generated<String>> {
        if text.trim().is_empty() {
            return Err(ApiError::bad_request(
                "Please enter some text to generate speech.",
            ));
        }
        if text.chars().count() > MAX_SPEECH_CHARACTERS {
            return Err(ApiError::bad_request(format!(
                "Text cannot exceed {} characters.",
                MAX_SPEECH_CHARACTERS
            )));
        }
        let credits = self.charge(user_id, GenerationKind::Speech).await?;
        let output = self.client()?.generate_speech(text, voice).await?;
        Ok(Generated { output, credits })
    }

    pub async fn storyboard(
        &self,
        user_id: &str,
        premise: &str,
    ) -> ApiResult<Generated<Vec<StoryboardScene>>> {
        if premise.trim().is_empty() {
            return Err(ApiError::bad_request("A premise is required"));
        }
        let credits = self.charge(user_id, GenerationKind::Storyboard).await?;
        let output = self.client()?.generate_storyboard(premise).await?;
        Ok(Generated { output, credits })
    }

    /// Render one storyboard scene's image prompt.
    pub async fn scene_image(
        &self,
        user_id: &str,
        image_prompt: &str,
        model: ImageModel,
    ) -> ApiResult<Generated<String>> {
        if image_prompt.trim().is_empty() {
            return Err(ApiError::bad_request("A scene image prompt is required"));
        }
        let credits = self.charge(user_id, GenerationKind::SceneImage).await?;
        let images = self.client()?.generate_image(image_prompt, 1, model).await?;
        let output = images
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::internal("Image model returned an empty result"))?;
        Ok(Generated { output, credits })
    }
}
