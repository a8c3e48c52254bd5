use axum::{
    Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use serde::Deserialize;
use tracing::{info, warn};

use cartas_client::ApiError;

use crate::error::WebError;
use crate::session::{SESSION_COOKIE, clear_session_cookie, session_cookie, token_expired};
use crate::state::SharedState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// GET /login: Skip straight to the dashboard when the cookie is still good.
pub async fn login_page(jar: CookieJar) -> Result<Response, WebError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !token_expired(cookie.value()) {
            return Ok(Redirect::to("/").into_response());
        }
    }
    Ok(views::render("login.html", context! {})?.into_response())
}

fn login_form(email: &str, error: &str) -> Result<Html<String>, WebError> {
    Ok(views::render(
        "login.html",
        context! { email => email, error => error },
    )?)
}

/// POST /login: Exchange credentials for the API's token.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(login_form(&form.email, "Ingrese su correo y contraseña")?.into_response());
    }

    let token = match state.api.login(&form.email, &form.password).await {
        Ok(res) => res.token,
        Err(ApiError::Unauthorized(message)) if message.eq_ignore_ascii_case("unauthorized") => {
            warn!("Login rejected for {}", form.email.trim());
            return Ok(login_form(&form.email, "Correo o contraseña incorrectos")?.into_response());
        }
        Err(e) => {
            warn!("Login failed for {}: {}", form.email.trim(), e);
            return Ok(login_form(&form.email, &e.to_string())?.into_response());
        }
    };

    let profile = state.sessions.profile(&state.api, &token).await?;
    info!("{} signed in", profile.email);

    let jar = jar.add(session_cookie(token, state.secure_cookies));
    Ok((jar, Redirect::to("/")).into_response())
}

/// POST /logout
pub async fn logout(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
        info!("Session closed");
    }
    (clear_session_cookie(jar), Redirect::to("/login"))
}
