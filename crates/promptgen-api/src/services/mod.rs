//! Business services.

pub mod generation;
pub mod payment;
pub mod session;

pub use generation::{Generated, GenerationService};
pub use payment::{PaymentGateway, PurchaseState, PurchaseView};
pub use session::{ReferralStore, SessionStore};
