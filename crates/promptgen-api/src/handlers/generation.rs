//! Generation handlers.
//!
//! Each endpoint spends its fixed credit cost before calling the generation
//! backend; failures after the spend are surfaced as messages with the
//! credits already gone.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use promptgen_models::{
    ConsistencyResult, ImageData, ImageModel, LanguageCode, SpeechVoice, StoryboardScene,
    VideoModel,
};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PromptResponse {
    pub prompt: String,
    /// Balance after the spend.
    pub credits: u32,
}

#[derive(Debug, Deserialize)]
pub struct VideoPromptRequest {
    pub influencer_image: ImageData,
    pub product_images: Vec<ImageData>,
    #[serde(default)]
    pub language: LanguageCode,
}

pub async fn generate_video_prompt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VideoPromptRequest>,
) -> ApiResult<Json<PromptResponse>> {
    let generated = state
        .generation
        .video_prompt(
            &user.uid,
            &request.influencer_image,
            &request.product_images,
            request.language,
        )
        .await?;
    Ok(Json(PromptResponse {
        prompt: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProductAdPromptRequest {
    pub product_images: Vec<ImageData>,
    #[serde(default)]
    pub language: LanguageCode,
}

pub async fn generate_product_ad_prompt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ProductAdPromptRequest>,
) -> ApiResult<Json<PromptResponse>> {
    let generated = state
        .generation
        .product_ad_prompt(&user.uid, &request.product_images, request.language)
        .await?;
    Ok(Json(PromptResponse {
        prompt: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InfluencerPromptRequest {
    pub influencer_image: ImageData,
    pub actions: String,
    #[serde(default)]
    pub language: LanguageCode,
}

pub async fn generate_influencer_prompt(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<InfluencerPromptRequest>,
) -> ApiResult<Json<PromptResponse>> {
    let generated = state
        .generation
        .influencer_prompt(
            &user.uid,
            &request.influencer_image,
            &request.actions,
            request.language,
        )
        .await?;
    Ok(Json(PromptResponse {
        prompt: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConsistencyRequest {
    pub prompt: String,
}

/// Audit a generated prompt for consistency. Does not charge credits.
pub async fn check_consistency(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<ConsistencyRequest>,
) -> ApiResult<Json<ConsistencyResult>> {
    let result = state.generation.check_consistency(&request.prompt).await?;
    Ok(Json(result))
}

fn default_image_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    #[serde(default = "default_image_count")]
    pub number_of_images: u32,
    pub model: ImageModel,
}

#[derive(Serialize)]
pub struct ImagesResponse {
    /// Generated images as data URLs.
    pub images: Vec<String>,
    pub credits: u32,
}

pub async fn generate_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ImageRequest>,
) -> ApiResult<Json<ImagesResponse>> {
    let generated = state
        .generation
        .image(
            &user.uid,
            &request.prompt,
            request.number_of_images,
            request.model,
        )
        .await?;
    Ok(Json(ImagesResponse {
        images: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub prompt: String,
    pub model: VideoModel,
}

#[derive(Serialize)]
pub struct VideoResponse {
    pub video_url: String,
    pub credits: u32,
}

pub async fn generate_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VideoRequest>,
) -> ApiResult<Json<VideoResponse>> {
    let generated = state
        .generation
        .video(&user.uid, &request.prompt, request.model)
        .await?;
    Ok(Json(VideoResponse {
        video_url: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice: SpeechVoice,
}

#[derive(Serialize)]
pub struct SpeechResponse {
    /// Base64-encoded PCM audio.
    pub audio_base64: String,
    pub credits: u32,
}

pub async fn generate_speech(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SpeechRequest>,
) -> ApiResult<Json<SpeechResponse>> {
    let generated = state
        .generation
        .speech(&user.uid, &request.text, request.voice)
        .await?;
    Ok(Json(SpeechResponse {
        audio_base64: generated.output,
        credits: generated.credits,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StoryboardRequest {
    pub premise: String,
}

#[derive(Serialize)]
pub struct StoryboardResponse {
    pub scenes: Vec<StoryboardScene>,
    pub credits: u32,
}

pub async fn generate_storyboard(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<StoryboardRequest>,
) -> ApiResult<Json<StoryboardResponse>> {
    let generated = state
        .generation
        .storyboard(&user.uid, &request.premise)
        .await?;
    Ok(Json(StoryboardResponse {
        scenes: generated.output,
        credits: generated.credits,
    }))
}

fn default_scene_image_model() -> ImageModel {
    ImageModel::Imagen4
}

#[derive(Debug, Deserialize)]
pub struct SceneImageRequest {
    pub image_prompt: String,
    #[serde(default = "default_scene_image_model")]
    pub model: ImageModel,
}

#[derive(Serialize)]
pub struct SceneImageResponse {
    pub image_url: String,
    pub credits: u32,
}

pub async fn generate_scene_image(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SceneImageRequest>,
) -> ApiResult<Json<SceneImageResponse>> {
    let generated = state
        .generation
        .scene_image(&user.uid, &request.image_prompt, request.model)
        .await?;
    Ok(Json(SceneImageResponse {
        image_url: generated.output,
        credits: generated.credits,
    }))
}
