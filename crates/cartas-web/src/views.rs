//! Template environment and the view models pages render.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use axum::response::Html;
use chrono::{DateTime, NaiveDate, Utc};
use minijinja::Environment;
use serde::Serialize;

use cartas_tracking::estado;
use cartas_tracking::{PageWindow, Plazo, comparar_fechas, fecha_local};
use cartas_types::Id;
use cartas_types::api::Meta;
use cartas_types::models::Carta;

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    for (name, source) in [
        ("base.html", include_str!("../templates/base.html")),
        ("macros.html", include_str!("../templates/macros.html")),
        ("error.html", include_str!("../templates/error.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("dashboard.html", include_str!("../templates/dashboard.html")),
        ("cartas.html", include_str!("../templates/cartas.html")),
        ("carta_nueva.html", include_str!("../templates/carta_nueva.html")),
        ("carta_detalle.html", include_str!("../templates/carta_detalle.html")),
        ("catalogo.html", include_str!("../templates/catalogo.html")),
        ("catalogo_form.html", include_str!("../templates/catalogo_form.html")),
    ] {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!("Template {} failed to compile: {}", name, e);
        }
    }
    env
});

pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<Html<String>, minijinja::Error> {
    TEMPLATES.get_template(name)?.render(ctx).map(Html)
}

pub fn fecha(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| fecha_local(ts).format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// One letter as a table row.
#[derive(Debug, Clone, Serialize)]
pub struct CartaRow {
    pub id: Id,
    pub codigo: String,
    pub asunto: String,
    pub empresa: String,
    pub area: String,
    pub estado: String,
    pub estado_class: &'static str,
    pub plazo: &'static str,
    pub plazo_class: &'static str,
    pub vencido: bool,
    pub vencimiento: String,
    pub fecha_ingreso: String,
    pub fecha_envio: String,
    pub emitido: bool,
    pub confidencial: bool,
    pub pdf: Option<String>,
    /// Where the download link points: stored absolute URLs as they are,
    /// file names through `/archivos`.
    pub pdf_href: Option<String>,
}

impl CartaRow {
    pub fn new(carta: &Carta, hoy: NaiveDate) -> Self {
        let (estado, estado_class) = estado::badge(carta.estado.as_deref());
        let plazo = comparar_fechas(carta.vencimiento.map(fecha_local), hoy);
        Self {
            id: carta.id,
            codigo: carta.codigo().to_string(),
            asunto: carta.asunto.clone(),
            empresa: carta.empresa_nombre().unwrap_or("").to_string(),
            area: carta.area_nombre().unwrap_or("").to_string(),
            estado,
            estado_class,
            plazo: plazo.label(),
            plazo_class: plazo.css_class(),
            vencido: plazo == Plazo::FueraDePlazo,
            vencimiento: fecha(carta.vencimiento),
            fecha_ingreso: fecha(carta.fecha_ingreso),
            fecha_envio: fecha(carta.fecha_envio),
            emitido: carta.emitido,
            confidencial: carta.es_confidencial,
            pdf: carta.pdf_info.clone(),
            pdf_href: carta.pdf_info.as_deref().map(pdf_href),
        }
    }

    pub fn many(cartas: &[Carta], hoy: NaiveDate) -> Vec<Self> {
        cartas.iter().map(|c| Self::new(c, hoy)).collect()
    }
}

fn pdf_href(file_ref: &str) -> String {
    let file_ref = file_ref.trim();
    if file_ref.starts_with("http://") || file_ref.starts_with("https://") {
        file_ref.to_string()
    } else {
        format!("/archivos/{}", urlencoding::encode(file_ref))
    }
}

/// Pager plus the query string that keeps the current filters.
#[derive(Debug, Clone, Serialize)]
pub struct Pager {
    pub window: PageWindow,
    pub total: u64,
    pub filters: BTreeMap<String, String>,
}

impl Pager {
    pub fn from_meta(meta: &Meta, filters: BTreeMap<String, String>) -> Self {
        Self {
            window: PageWindow::new(meta.page, meta.last_page),
            total: meta.total,
            filters,
        }
    }

    pub fn local(page: u32, total: usize, per_page: u32, filters: BTreeMap<String, String>) -> Self {
        Self {
            window: PageWindow::from_total(page, total as u64, per_page),
            total: total as u64,
            filters,
        }
    }
}

/// Non-empty filters, in a stable order, for pager links.
pub fn filters<'a, I>(pairs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .filter_map(|(k, v)| {
            v.map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (k.to_string(), v.to_string()))
        })
        .collect()
}

/// `path` with a percent-encoded flash message in its query string.
pub fn flash(path: &str, key: &str, message: &str) -> String {
    format!("{path}?{key}={}", urlencoding::encode(message))
}
