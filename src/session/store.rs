//! Session store: the process-wide identity context.
//!
//! Created once with [`SessionStore::init`], which rehydrates from storage,
//! and shared as `Arc<SessionStore>`. Every successful auth call writes the
//! token and user to storage in one batch before the in-memory copy is
//! swapped, so memory and storage always agree.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use super::model::{Session, User};
use super::storage::{SessionStorage, TOKEN_KEY, USER_KEY};
use crate::api::{AuthApi, AuthResponse};
use crate::error::{ApiError, SessionError};

/// Shown when Google login is attempted without an OAuth client id.
pub const GOOGLE_NOT_CONFIGURED: &str = "Google Sign-in integration requires Google OAuth setup";

pub struct SessionStore {
    auth: AuthApi,
    storage: Arc<dyn SessionStorage>,
    google_client_id: Option<String>,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Build the store and restore any persisted session.
    ///
    /// Malformed or half-written session data is discarded (and removed from
    /// storage), never reported as an error.
    pub async fn init(
        auth: AuthApi,
        storage: Arc<dyn SessionStorage>,
        google_client_id: Option<String>,
    ) -> Self {
        let restored = rehydrate(storage.as_ref()).await;
        if let Some(ref session) = restored {
            info!(user_id = session.user.id, "Restored saved session");
        }
        Self {
            auth,
            storage,
            google_client_id,
            current: RwLock::new(restored),
        }
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    /// The full session (user plus token), if any.
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let response = self.auth.login(email, password).await?;
        self.establish(response).await
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::Validation("Name is required".to_string()));
        }
        let response = self.auth.signup(name.trim(), email, password).await?;
        self.establish(response).await
    }

    /// Sign in with a Google OAuth token. Refused unless a client id is configured.
    pub async fn google_login(&self, google_token: &str) -> Result<User, SessionError> {
        if self.google_client_id.is_none() {
            return Err(SessionError::NotConfigured(GOOGLE_NOT_CONFIGURED.to_string()));
        }
        let response = self.auth.google_login(google_token).await?;
        self.establish(response).await
    }

    /// Forget the session. Safe to call when already signed out.
    ///
    /// Storage is cleared first; if that fails the session stays signed in.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let mut current = self.current.write().await;
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY]).await?;
        if let Some(session) = current.take() {
            info!(user_id = session.user.id, "Logged out");
        }
        Ok(())
    }

    async fn establish(&self, response: AuthResponse) -> Result<User, SessionError> {
        let AuthResponse { token, user, .. } = response;
        if token.is_empty() {
            return Err(ApiError::new("auth", "Server returned an empty token").into());
        }
        let user_json = serde_json::to_string(&user).map_err(crate::error::StorageError::from)?;

        let mut current = self.current.write().await;
        self.storage
            .set_many(&[(TOKEN_KEY, token.as_str()), (USER_KEY, user_json.as_str())])
            .await?;
        *current = Some(Session::new(user.clone(), token));

        info!(user_id = user.id, "Signed in");
        Ok(user)
    }
}

/// Read the persisted pair. Anything short of a complete, parseable pair is
/// wiped.
async fn rehydrate(storage: &dyn SessionStorage) -> Option<Session> {
    let token = read_key(storage, TOKEN_KEY).await;
    let user_json = read_key(storage, USER_KEY).await;

    let session = match (token, user_json) {
        (None, None) => return None,
        (Some(token), Some(user_json)) => match serde_json::from_str::<User>(&user_json) {
            Ok(user) => Some(Session::new(user, token)),
            Err(e) => {
                warn!(error = %e, "Stored user is malformed; discarding session");
                None
            }
        },
        _ => {
            warn!("Stored session is incomplete; discarding it");
            None
        }
    };

    if session.is_none() {
        if let Err(e) = storage.remove_many(&[TOKEN_KEY, USER_KEY]).await {
            warn!(error = %e, "Could not clear discarded session");
        }
    }
    session
}

async fn read_key(storage: &dyn SessionStorage, key: &str) -> Option<String> {
    match storage.get(key).await {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!(key, error = %e, "Could not read session storage");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::session::storage::MemoryStorage;

    /// An auth facade pointed at a closed port; these tests never reach it.
    fn offline_auth(storage: Arc<dyn SessionStorage>) -> AuthApi {
        let client = ApiClient::new(
            reqwest::Url::parse("http://127.0.0.1:9").unwrap(),
            Some(std::time::Duration::from_secs(1)),
            storage,
        )
        .unwrap();
        AuthApi::new(Arc::new(client))
    }

    async fn store_with(storage: Arc<MemoryStorage>, google: Option<&str>) -> SessionStore {
        SessionStore::init(
            offline_auth(storage.clone()),
            storage,
            google.map(str::to_string),
        )
        .await
    }

    #[tokio::test]
    async fn rehydrates_complete_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[
                (TOKEN_KEY, "jwt"),
                (USER_KEY, r#"{"id":1,"name":"Ada","email":"ada@utdallas.edu"}"#),
            ])
            .await
            .unwrap();

        let store = store_with(storage, None).await;
        let session = store.current().await.unwrap();
        assert_eq!(session.user.name, "Ada");
        assert_eq!(session.token(), "jwt");
    }

    #[tokio::test]
    async fn malformed_user_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[(TOKEN_KEY, "jwt"), (USER_KEY, "{not json")])
            .await
            .unwrap();

        let store = store_with(storage.clone(), None).await;
        assert!(!store.is_authenticated().await);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn token_without_user_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_many(&[(TOKEN_KEY, "jwt")]).await.unwrap();

        let store = store_with(storage.clone(), None).await;
        assert!(store.current_user().await.is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone(), None).await;

        store.logout().await.unwrap();
        store.logout().await.unwrap();
        assert!(store.current_user().await.is_none());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn logout_clears_restored_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_many(&[
                (TOKEN_KEY, "jwt"),
                (USER_KEY, r#"{"id":1,"name":"Ada","email":"ada@utdallas.edu"}"#),
            ])
            .await
            .unwrap();
        let store = store_with(storage.clone(), None).await;
        assert!(store.is_authenticated().await);

        store.logout().await.unwrap();
        assert!(!store.is_authenticated().await);
        assert!(storage.is_empty());
    }

    /// Storage that accepts writes but refuses to delete.
    #[derive(Default)]
    struct UndeletableStorage {
        inner: MemoryStorage,
    }

    #[async_trait::async_trait]
    impl SessionStorage for UndeletableStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, crate::error::StorageError> {
            self.inner.get(key).await
        }

        async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), crate::error::StorageError> {
            self.inner.set_many(entries).await
        }

        async fn remove_many(&self, _keys: &[&str]) -> Result<(), crate::error::StorageError> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[tokio::test]
    async fn failed_logout_keeps_session() {
        let storage = Arc::new(UndeletableStorage::default());
        storage
            .set_many(&[
                (TOKEN_KEY, "jwt"),
                (USER_KEY, r#"{"id":1,"name":"Ada","email":"ada@utdallas.edu"}"#),
            ])
            .await
            .unwrap();
        let store = SessionStore::init(offline_auth(storage.clone()), storage.clone(), None).await;
        assert!(store.is_authenticated().await);

        let err = store.logout().await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));

        // Memory still matches storage: the token is still there, so still signed in.
        assert!(store.is_authenticated().await);
        assert_eq!(storage.get(TOKEN_KEY).await.unwrap().as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn signup_requires_name() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage, None).await;

        let err = store.signup("   ", "a@b.edu", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[tokio::test]
    async fn google_login_needs_configuration() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone(), None).await;

        let err = store.google_login("google-token").await.unwrap_err();
        assert!(matches!(err, SessionError::NotConfigured(_)));
        assert_eq!(err.to_string(), GOOGLE_NOT_CONFIGURED);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn failed_login_leaves_no_session() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(storage.clone(), None).await;

        let err = store.login("a@b.edu", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), "Login failed");
        assert!(!store.is_authenticated().await);
        assert!(storage.is_empty());
    }
}
