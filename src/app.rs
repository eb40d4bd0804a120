//! Application wiring: builds the shared components from configuration.

use std::sync::Arc;

use crate::api::{ApiClient, AuthApi, ProgressApi, QuestionApi};
use crate::chat::{AnswerGrader, Chatbot, RandomGrader, RemoteBackend, TutorBackend};
use crate::config::ClientConfig;
use crate::dashboard::DashboardView;
use crate::error::Result;
use crate::session::{SessionStorage, SessionStore};

/// Everything the front end needs, built once at startup.
pub struct App {
    pub config: ClientConfig,
    pub client: Arc<ApiClient>,
    pub session: Arc<SessionStore>,
    pub backend: Arc<dyn TutorBackend>,
    pub grader: Arc<dyn AnswerGrader>,
    pub progress: ProgressApi,
}

impl App {
    /// Wire the client, facades, and session store. Restores a saved session
    /// from `storage` if there is one.
    pub async fn build(config: ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let client = Arc::new(ApiClient::new(
            config.api_url.clone(),
            config.http_timeout,
            Arc::clone(&storage),
        )?);

        let auth = AuthApi::new(Arc::clone(&client));
        let questions = QuestionApi::new(Arc::clone(&client));
        let progress = ProgressApi::new(Arc::clone(&client));

        let session = Arc::new(
            SessionStore::init(auth, storage, config.google_client_id.clone()).await,
        );
        let backend: Arc<dyn TutorBackend> =
            Arc::new(RemoteBackend::new(questions, progress.clone()));
        let grader: Arc<dyn AnswerGrader> = Arc::new(RandomGrader::new(config.correct_rate));

        Ok(Self {
            config,
            client,
            session,
            backend,
            grader,
            progress,
        })
    }

    /// A fresh conversation, greeting included.
    pub fn new_chatbot(&self) -> Chatbot {
        Chatbot::new(Arc::clone(&self.backend), Arc::clone(&self.grader))
    }

    pub fn dashboard(&self) -> DashboardView {
        DashboardView::new(self.progress.clone())
    }
}
