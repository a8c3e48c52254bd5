use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;
use crate::{auth, cartas, catalogs, dashboard, files, session};

/// Multipart bodies carry a PDF of up to 20 MB plus the form fields.
const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

pub fn build_router(state: SharedState) -> Router {
    let public_routes = Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/health", get(|| async { "ok" }));

    let protected_routes = Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/cartas", get(cartas::todas))
        .route("/cartas/recibidas", get(cartas::recibidas))
        .route("/cartas/asignadas", get(cartas::asignadas))
        .route("/cartas/pendientes", get(cartas::pendientes))
        .route("/cartas/emitidas", get(cartas::emitidas))
        .route("/cartas/nueva", get(cartas::nueva).post(cartas::crear))
        .route("/cartas/{id}", get(cartas::detalle))
        .route("/cartas/{id}/asignar", post(cartas::asignar))
        .route("/cartas/{id}/responder", post(cartas::responder))
        .route("/cartas/{id}/cerrar", post(cartas::cerrar))
        .route("/archivos/{*file}", get(files::descargar))
        .nest("/admin", catalogs::admin_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
