use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use minijinja::context;
use thiserror::Error;
use tracing::{error, warn};

use cartas_client::ApiError;

use crate::session::clear_session_cookie;
use crate::views;

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("No tiene permisos para acceder a esta sección")]
    Forbidden,

    #[error("Solicitud inválida: {0}")]
    BadRequest(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Api(ApiError::Unauthorized(_)) => {
                // The API no longer accepts the token; start over at the login page.
                let jar = clear_session_cookie(CookieJar::new());
                return (jar, Redirect::to("/login")).into_response();
            }
            Self::Api(e) => match e.status() {
                Some(code) if (400..500).contains(&code) => {
                    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::Template(e) => {
                error!("Template rendering failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let message = match &self {
            Self::Template(_) => "Error interno al generar la página".to_string(),
            other => other.to_string(),
        };
        warn!("Request failed with {}: {}", status, message);

        let body = views::render(
            "error.html",
            context! { status => status.as_u16(), message => message },
        )
        .unwrap_or_else(|e| {
            error!("Error page failed to render: {}", e);
            Html(format!("<h1>{}</h1>", status.as_u16()))
        });
        (status, body).into_response()
    }
}
