//! Auth facade: login, signup, and Google login.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::client::{ApiClient, Endpoint, EndpointMethod};
use crate::error::ApiError;
use crate::session::model::User;

const LOGIN: Endpoint = Endpoint {
    method: EndpointMethod::Post,
    path: "/api/auth/login",
    authenticated: false,
    operation: "login",
    default_error: "Login failed",
};

const SIGNUP: Endpoint = Endpoint {
    method: EndpointMethod::Post,
    path: "/api/auth/signup",
    authenticated: false,
    operation: "signup",
    default_error: "Signup failed",
};

const GOOGLE_LOGIN: Endpoint = Endpoint {
    method: EndpointMethod::Post,
    path: "/api/auth/google-login",
    authenticated: true,
    operation: "google_login",
    default_error: "Google login failed",
};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct GoogleLoginRequest<'a> {
    token: &'a str,
}

/// Successful auth reply.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub message: Option<String>,
}

/// Typed wrapper over `/api/auth/*`.
#[derive(Clone)]
pub struct AuthApi {
    client: Arc<ApiClient>,
}

impl AuthApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.client
            .call(&LOGIN, Some(&LoginRequest { email, password }))
            .await
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        self.client
            .call(
                &SIGNUP,
                Some(&SignupRequest {
                    name,
                    email,
                    password,
                }),
            )
            .await
    }

    pub async fn google_login(&self, token: &str) -> Result<AuthResponse, ApiError> {
        self.client
            .call(&GOOGLE_LOGIN, Some(&GoogleLoginRequest { token }))
            .await
    }
}
