use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tracing::{debug, warn};

use cartas_client::download_url;

use crate::error::WebError;
use crate::state::SharedState;

/// GET /archivos/{*file}: Send the browser to where the file is stored.
pub async fn descargar(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Redirect, WebError> {
    if file.trim().is_empty() || file.split('/').any(|segment| segment == "..") {
        return Err(WebError::BadRequest("Nombre de archivo inválido".into()));
    }
    let url = download_url(&state.files_url, &file);
    let base = format!("{}/", state.files_url.trim_end_matches('/'));
    if !url.starts_with(&base) {
        warn!("Refusing to redirect {} outside the file service", file);
        return Err(WebError::BadRequest("Nombre de archivo inválido".into()));
    }
    debug!("Redirecting {} to {}", file, url);
    Ok(Redirect::temporary(&url))
}
