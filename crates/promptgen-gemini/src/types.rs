//! Gemini REST API wire types.

use serde::{Deserialize, Serialize};

use promptgen_models::ImageData;

// =============================================================================
// generateContent
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// A single-turn request with the given parts.
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            parts: vec![Part::text(instruction)],
        });
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline image part.
    pub fn image(image: &ImageData) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.base64.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    /// JSON schema constraining the response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

impl SpeechConfig {
    pub fn voice(name: impl Into<String>) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: name.into(),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: ResponseContent,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub text: Option<String>,
    pub inline_data: Option<ResponseInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

// =============================================================================
// Image prediction (Imagen)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PredictImageRequest {
    pub instances: Vec<PromptInstance>,
    pub parameters: ImageParameters,
}

#[derive(Debug, Serialize)]
pub struct PromptInstance {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
    pub output_mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictImageResponse {
    #[serde(default)]
    pub predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrediction {
    pub bytes_base64_encoded: Option<String>,
    pub mime_type: Option<String>,
}

// =============================================================================
// Video prediction (Veo long-running operations)
// =============================================================================

#[derive(Debug, Serialize)]
pub struct PredictVideoRequest {
    pub instances: Vec<PromptInstance>,
    pub parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    pub sample_count: u32,
    pub aspect_ratio: String,
    pub resolution: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<VideoOperationResponse>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOperationResponse {
    #[serde(default)]
    pub generated_videos: Vec<GeneratedVideo>,
    /// Some API revisions nest samples under a response wrapper.
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedVideo {
    pub video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
pub struct VideoRef {
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl VideoOperationResponse {
    /// First generated video URI across API revisions.
    pub fn first_video_uri(&self) -> Option<&str> {
        let from_videos = self
            .generated_videos
            .iter()
            .find_map(|v| v.video.as_ref().and_then(|r| r.uri.as_deref()));
        from_videos.or_else(|| {
            self.generate_video_response.as_ref().and_then(|r| {
                r.generated_samples
                    .iter()
                    .find_map(|v| v.video.as_ref().and_then(|r| r.uri.as_deref()))
            })
        })
    }
}
