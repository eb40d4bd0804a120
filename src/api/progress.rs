//! Progress facade: save an answered question, fetch dashboard aggregates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Endpoint, EndpointMethod};
use crate::dashboard::model::DashboardData;
use crate::error::ApiError;

const SAVE_PROGRESS: Endpoint = Endpoint {
    method: EndpointMethod::Post,
    path: "/api/progress/save",
    authenticated: true,
    operation: "save_progress",
    default_error: "Failed to save progress",
};

const DASHBOARD: Endpoint = Endpoint {
    method: EndpointMethod::Get,
    path: "/api/progress/dashboard",
    authenticated: true,
    operation: "dashboard",
    default_error: "Failed to fetch dashboard data",
};

/// One answered question, as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub topic: String,
    pub difficulty: String,
}

/// Server acknowledgement of a saved record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SaveAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub progress_id: Option<i64>,
}

#[derive(Clone)]
pub struct ProgressApi {
    client: Arc<ApiClient>,
}

impl ProgressApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn save_progress(&self, record: &ProgressRecord) -> Result<SaveAck, ApiError> {
        self.client.call(&SAVE_PROGRESS, Some(record)).await
    }

    pub async fn dashboard(&self) -> Result<DashboardData, ApiError> {
        self.client.call::<(), _>(&DASHBOARD, None).await
    }
}
