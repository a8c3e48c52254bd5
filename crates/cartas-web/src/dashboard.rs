use axum::{
    Extension,
    extract::{Query, State},
    response::Html,
};
use minijinja::context;
use serde::{Deserialize, Serialize};

use cartas_client::PageQuery;
use cartas_tracking::{Estado, hoy, matches_search, paginate};
use cartas_types::api::Paginated;
use cartas_types::models::Carta;

use crate::error::WebError;
use crate::session::Session;
use crate::state::SharedState;
use crate::views::{self, CartaRow, Pager, filters};

/// Pending letters pulled for the dashboard in one request.
const PENDING_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub page: Option<u32>,
    /// Filters the overdue list in place.
    pub search: Option<String>,
    pub msg: Option<String>,
}

#[derive(Debug, Serialize)]
struct EstadoCount {
    label: String,
    class: &'static str,
    count: usize,
}

fn por_estado(cartas: &[Carta]) -> Vec<EstadoCount> {
    Estado::CONOCIDOS
        .iter()
        .map(|estado| EstadoCount {
            label: estado.label().to_string(),
            class: estado.css_class(),
            count: cartas
                .iter()
                .filter(|c| Estado::from_option(c.estado.as_deref()).as_ref() == Some(estado))
                .count(),
        })
        .collect()
}

/// GET /: The signed-in user's area at a glance.
pub async fn dashboard(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<DashboardQuery>,
) -> Result<Html<String>, WebError> {
    let area = session.profile.area_id();
    let pendientes = match area {
        Some(area) => {
            let query = PageQuery::new(1, PENDING_LIMIT);
            let key = session.cache_key(query.cache_key(&format!("cards/pending/{area}")));
            state
                .cache
                .get_or_fetch(&key, || session.api.pending(area, &query))
                .await?
        }
        None => Paginated::empty(PENDING_LIMIT),
    };

    let totals = PageQuery::new(1, 1);
    let recibidas = state
        .cache
        .get_or_fetch(&session.cache_key(totals.cache_key("cards/received")), || {
            session.api.received(&totals)
        })
        .await?;

    let term = q.search.as_deref().unwrap_or_default();
    let vencidas: Vec<CartaRow> = CartaRow::many(&pendientes.data, hoy())
        .into_iter()
        .filter(|row| row.vencido)
        .filter(|row| {
            matches_search(
                [row.codigo.as_str(), row.asunto.as_str(), row.empresa.as_str()],
                term,
            )
        })
        .collect();
    let page = q.page.unwrap_or(1);
    let pager = Pager::local(
        page,
        vencidas.len(),
        state.page_size,
        filters([("search", q.search.as_deref())]),
    );

    Ok(views::render(
        "dashboard.html",
        context! {
            session => session.view(),
            recibidas => recibidas.meta.total,
            pendientes => pendientes.meta.total.max(pendientes.data.len() as u64),
            por_estado => por_estado(&pendientes.data),
            vencidas_total => vencidas.len(),
            vencidas => paginate(&vencidas, page, state.page_size),
            pager => pager,
            search => q.search,
            sin_area => area.is_none(),
            msg => q.msg,
        },
    )?)
}
