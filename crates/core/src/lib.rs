//! Questscribe core types and utilities

pub mod auth;
pub mod error;
pub mod history;
pub mod session;
pub mod subscription;
pub mod types;

pub use auth::TokenClaims;
pub use error::{CoreError, CoreResult};
pub use history::SubmissionWindow;
pub use session::{FileTokenStore, MemoryTokenStore, SessionContext, SessionEvent, TokenStore};
pub use subscription::{Subscription, SubscriptionStatus, SubscriptionTier, Transaction};
pub use types::{Character, ConversationMessage, Session, Submission};
