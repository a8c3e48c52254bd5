use reqwest::Method;
use tracing::info;

use cartas_types::api::{LoginRequest, LoginResponse, Profile};

use crate::{ApiClient, ApiError};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let req = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self
            .send(self.request(Method::POST, "auth/login").json(&req))
            .await?;
        info!("Login succeeded for {}", req.email);
        Ok(res)
    }

    /// The user the current token belongs to.
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        if self.token().is_none() {
            return Err(ApiError::Unauthorized("Sesión no iniciada".into()));
        }
        self.send(self.request(Method::GET, "auth/profile")).await
    }
}
