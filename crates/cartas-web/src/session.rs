//! Dashboard sessions.
//!
//! The browser holds the API's bearer token in an HttpOnly cookie. The token's
//! `exp` claim is checked locally; its signature is the API's business. The
//! profile behind each token is kept in a [`SessionStore`] so a page view does
//! not cost an extra `auth/profile` round trip.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use cartas_client::{ApiClient, ApiError};
use cartas_types::api::Profile;

use crate::error::WebError;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "cartas_session";

/// Claims the dashboard reads from the API's token.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub exp: u64,
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
}

/// Whether `token` is unreadable or past its `exp`.
pub fn token_expired(token: &str) -> bool {
    let Ok(header) = decode_header(token) else {
        return true;
    };
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.set_required_spec_claims(&["exp"]);
    validation.validate_aud = false;
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).is_err()
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Expire the session cookie, whether or not this request carried it.
pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    jar.add(cookie)
}

/// The authenticated user of the current request.
#[derive(Clone)]
pub struct Session {
    pub token: String,
    pub profile: Profile,
    pub api: ApiClient,
}

impl Session {
    pub fn require_admin(&self) -> Result<(), WebError> {
        if self.profile.is_admin() {
            Ok(())
        } else {
            Err(WebError::Forbidden)
        }
    }

    /// Cache key for data the API may filter per user. The resource path
    /// stays in front so `invalidate_prefix` still reaches every user.
    pub fn cache_key(&self, key: String) -> String {
        format!("{key}@{}", self.profile.id)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            nombre: match self.profile.apellido.as_deref() {
                Some(apellido) if !apellido.trim().is_empty() => {
                    format!("{} {}", self.profile.nombre, apellido)
                }
                _ => self.profile.nombre.clone(),
            },
            email: self.profile.email.clone(),
            rol: self.profile.rol_nombre().to_string(),
            area: self
                .profile
                .area_responsable
                .as_ref()
                .map(|a| a.nombre.clone()),
            is_admin: self.profile.is_admin(),
        }
    }
}

/// What templates see of the session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub nombre: String,
    pub email: String,
    pub rol: String,
    pub area: Option<String>,
    pub is_admin: bool,
}

/// Profiles of signed-in tokens, refreshed after the staleness window.
pub struct SessionStore {
    ttl: Duration,
    profiles: RwLock<HashMap<String, (Instant, Profile)>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    pub async fn profile(&self, api: &ApiClient, token: &str) -> Result<Profile, ApiError> {
        if let Some((loaded_at, profile)) = self.profiles.read().await.get(token) {
            if loaded_at.elapsed() < self.ttl {
                return Ok(profile.clone());
            }
        }

        debug!("Loading profile for session");
        let profile = api.with_token(token).profile().await?;
        self.profiles
            .write()
            .await
            .insert(token.to_string(), (Instant::now(), profile.clone()));
        Ok(profile)
    }

    pub async fn insert(&self, token: &str, profile: Profile) {
        self.profiles
            .write()
            .await
            .insert(token.to_string(), (Instant::now(), profile));
    }

    pub async fn remove(&self, token: &str) {
        self.profiles.write().await.remove(token);
    }

    /// Forget profiles past the staleness window or whose token has expired.
    pub async fn purge_stale(&self) {
        let ttl = self.ttl;
        let mut profiles = self.profiles.write().await;
        let before = profiles.len();
        profiles.retain(|token, (loaded_at, _)| loaded_at.elapsed() < ttl && !token_expired(token));
        debug!("purged {} stale sessions", before - profiles.len());
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

/// Resolve the session cookie into a [`Session`] request extension, or send
/// the browser to the login page.
pub async fn require_session(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Redirect::to("/login").into_response();
    };

    if token_expired(&token) {
        info!("Session token expired");
        state.sessions.remove(&token).await;
        return (clear_session_cookie(jar), Redirect::to("/login")).into_response();
    }

    match state.sessions.profile(&state.api, &token).await {
        Ok(profile) => {
            let api = state.api.with_token(&token);
            req.extensions_mut().insert(Session {
                token,
                profile,
                api,
            });
            next.run(req).await
        }
        Err(e) if e.is_unauthorized() => {
            state.sessions.remove(&token).await;
            (clear_session_cookie(jar), Redirect::to("/login")).into_response()
        }
        Err(e) => WebError::from(e).into_response(),
    }
}
