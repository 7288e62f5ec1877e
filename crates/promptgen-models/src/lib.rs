//! Shared data models for the PromptGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - User profiles, roles, and affiliate attributes
//! - PIX charges and card payments
//! - Purchase transactions and commission records
//! - Generation requests (models, languages, voices, costs)
//! - The PIX BR Code payload codec

pub mod announcement;
pub mod charge;
pub mod generation;
pub mod pix;
pub mod transaction;
pub mod user;

// Re-export common types
pub use announcement::Announcement;
pub use charge::{
    CardPaymentResult, CardStatus, ChargeStatus, PaymentStatus, PixCharge, NOT_CONFIGURED_CHARGE_ID,
};
pub use generation::{
    AspectRatio, ConsistencyResult, GenerationKind, ImageData, ImageModel, LanguageCode,
    SpeechVoice, StoryboardScene, VideoModel, MAX_SPEECH_CHARACTERS,
};
pub use pix::{BrCodeBuilder, BrCodeError};
pub use transaction::Transaction;
pub use user::{UserProfile, UserRole, DEFAULT_COMMISSION_RATE, WELCOME_CREDITS};
