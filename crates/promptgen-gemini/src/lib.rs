//! Gemini REST API client for the PromptGen backend.
//!
//! One client covers every generation surface the product exposes:
//! - Prompt generation (influencer, product ad, influencer-only)
//! - Prompt consistency audits (JSON schema responses)
//! - Image generation (Imagen and flash-image)
//! - Video generation (Veo long-running operations)
//! - Speech synthesis (TTS)
//! - Storyboard generation

pub mod client;
pub mod error;
pub mod prompts;
pub mod types;

pub use client::GeminiClient;
pub use error::{GeminiError, GeminiResult};
