//! Generation request models and credit costs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Maximum input length for speech synthesis.
pub const MAX_SPEECH_CHARACTERS: usize = 1000;

/// Supported output languages for generated prompts and dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    En,
    Pt,
    Fr,
    Es,
    It,
    Af,
    Zh,
    Ja,
    Ar,
}

impl LanguageCode {
    /// English display name, embedded into prompt templates.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Pt => "Portuguese (Brazil)",
            Self::Fr => "French",
            Self::Es => "Spanish",
            Self::It => "Italian",
            Self::Af => "Afrikaans",
            Self::Zh => "Chinese",
            Self::Ja => "Japanese",
            Self::Ar => "Arabic",
        }
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self::En
    }
}

/// Image generation model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ImageModel {
    #[serde(rename = "imagen-4.0-generate-001")]
    Imagen4,
    #[serde(rename = "nano-banana")]
    NanoBanana,
    #[serde(rename = "grok-imagine")]
    GrokImagine,
}

impl ImageModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imagen4 => "imagen-4.0-generate-001",
            Self::NanoBanana => "nano-banana",
            Self::GrokImagine => "grok-imagine",
        }
    }
}

/// Video generation model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum VideoModel {
    #[serde(rename = "gemini-veo")]
    GeminiVeo,
    #[serde(rename = "openai-sora")]
    OpenAiSora,
    #[serde(rename = "openai-sora-2")]
    OpenAiSora2,
}

impl VideoModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GeminiVeo => "gemini-veo",
            Self::OpenAiSora => "openai-sora",
            Self::OpenAiSora2 => "openai-sora-2",
        }
    }
}

/// Output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "3:4")]
    ThreeFour,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
            Self::FourThree => "4:3",
            Self::ThreeFour => "3:4",
        }
    }
}

/// An uploaded image as inline bytes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageData {
    /// Base64-encoded image bytes
    pub base64: String,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
}

/// One scene of a generated storyboard.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoryboardScene {
    /// 1-based scene number
    pub scene: u32,
    /// Narrative description of the scene
    pub description: String,
    /// Image-generation prompt for the scene
    pub image_prompt: String,
    /// Rendered scene image (data URL), filled in on demand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Verdict of a prompt consistency audit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConsistencyResult {
    /// Is the prompt free of ambiguities that could cause visual deviation?
    pub consistent: bool,
    /// Brief explanation; names the ambiguous part when inconsistent.
    pub reason: String,
}

/// Prebuilt speech synthesis voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum SpeechVoice {
    Kore,
    Puck,
    Charon,
    Zephyr,
    Fenrir,
}

impl SpeechVoice {
    /// Voice name understood by the TTS API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Kore => "Kore",
            Self::Puck => "Puck",
            Self::Charon => "Charon",
            Self::Zephyr => "Zephyr",
            Self::Fenrir => "Fenrir",
        }
    }
}

impl Default for SpeechVoice {
    fn default() -> Self {
        Self::Kore
    }
}

/// Kind of credit-gated generation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    VideoPrompt,
    ProductAdPrompt,
    InfluencerPrompt,
    Image,
    Video,
    Speech,
    Storyboard,
    SceneImage,
}

impl GenerationKind {
    /// Credits charged for one invocation.
    ///
    /// Full video generation is the only multi-credit operation.
    pub fn credit_cost(&self) -> u32 {
        match self {
            Self::Video => 5,
            Self::VideoPrompt
            | Self::ProductAdPrompt
            | Self::InfluencerPrompt
            | Self::Image
            | Self::Speech
            | Self::Storyboard
            | Self::SceneImage => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VideoPrompt => "video_prompt",
            Self::ProductAdPrompt => "product_ad_prompt",
            Self::InfluencerPrompt => "influencer_prompt",
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "speech",
            Self::Storyboard => "storyboard",
            Self::SceneImage => "scene_image",
        }
    }

    /// Human-readable label for error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::VideoPrompt => "video prompt generation",
            Self::ProductAdPrompt => "product ad prompt generation",
            Self::InfluencerPrompt => "influencer prompt generation",
            Self::Image => "image generation",
            Self::Video => "video generation",
            Self::Speech => "speech generation",
            Self::Storyboard => "storyboard generation",
            Self::SceneImage => "scene image generation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_is_the_only_multi_credit_operation() {
        assert_eq!(GenerationKind::Video.credit_cost(), 5);
        for kind in [
            GenerationKind::VideoPrompt,
            GenerationKind::ProductAdPrompt,
            GenerationKind::InfluencerPrompt,
            GenerationKind::Image,
            GenerationKind::Speech,
            GenerationKind::Storyboard,
            GenerationKind::SceneImage,
        ] {
            assert_eq!(kind.credit_cost(), 1, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_language_display_names() {
        assert_eq!(LanguageCode::En.display_name(), "English");
        assert_eq!(LanguageCode::Pt.display_name(), "Portuguese (Brazil)");
    }

    #[test]
    fn test_image_model_wire_names() {
        let json = serde_json::to_string(&ImageModel::Imagen4).unwrap();
        assert_eq!(json, "\"imagen-4.0-generate-001\"");
        let model: ImageModel = serde_json::from_str("\"nano-banana\"").unwrap();
        assert_eq!(model, ImageModel::NanoBanana);
    }
}
