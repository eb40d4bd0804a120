//! Question-generation facade.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Endpoint, EndpointMethod};
use crate::chat::intent::{Difficulty, Topic};
use crate::error::ApiError;

const GENERATE_QUESTION: Endpoint = Endpoint {
    method: EndpointMethod::Post,
    path: "/api/ai/generate_question",
    authenticated: true,
    operation: "generate_question",
    default_error: "Failed to generate question",
};

/// Body of `POST /api/ai/generate_question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateQuestionRequest {
    pub topic: Topic,
    pub difficulty: Difficulty,
    /// The user's raw chat message, passed along as extra guidance.
    pub request: String,
}

/// A generated question. Topic and difficulty are echoed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub topic: String,
    pub difficulty: String,
}

#[derive(Clone)]
pub struct QuestionApi {
    client: Arc<ApiClient>,
}

impl QuestionApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn generate_question(
        &self,
        request: &GenerateQuestionRequest,
    ) -> Result<GeneratedQuestion, ApiError> {
        self.client.call(&GENERATE_QUESTION, Some(request)).await
    }
}
