//! Remote service facades over the practice API.
//!
//! One facade per endpoint family, all sharing one [`ApiClient`]:
//! - [`AuthApi`]: `/api/auth/*`
//! - [`QuestionApi`]: `/api/ai/generate_question`
//! - [`ProgressApi`]: `/api/progress/*`

pub mod auth;
pub mod client;
pub mod progress;
pub mod questions;

pub use auth::{AuthApi, AuthResponse};
pub use client::{ApiClient, HealthStatus};
pub use progress::{ProgressApi, ProgressRecord, SaveAck};
pub use questions::{GenerateQuestionRequest, GeneratedQuestion, QuestionApi};
