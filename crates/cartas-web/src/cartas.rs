//! Letter pages: the inboxes, registration of received letters and the
//! detail page where a letter is assigned, answered or closed.

use std::collections::HashMap;

use axum::{
    Extension, Form,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use minijinja::context;
use serde::Deserialize;
use tracing::{debug, info};

use cartas_client::{ApiError, Cartas, PageQuery, Resource};
use cartas_tracking::{Estado, FieldErrors, FormData, Modo, fecha_local, hoy};
use cartas_types::Id;
use cartas_types::api::Paginated;
use cartas_types::inputs::{AsignacionInput, CartaRecibidaInput, RespuestaInput};
use cartas_types::models::Carta;

use crate::error::WebError;
use crate::forms::{self, Field, Kind, Source, Values, checked, values};
use crate::session::Session;
use crate::state::{SelectOption, SharedState};
use crate::views::{self, CartaRow, Pager, filters, flash};

/// The letter lists reachable from the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bandeja {
    Todas,
    Recibidas,
    Asignadas,
    Pendientes,
    Emitidas,
}

impl Bandeja {
    pub fn titulo(self) -> &'static str {
        match self {
            Self::Todas => "Todas las cartas",
            Self::Recibidas => "Cartas recibidas",
            Self::Asignadas => "Cartas asignadas a mi área",
            Self::Pendientes => "Cartas pendientes de mi área",
            Self::Emitidas => "Cartas emitidas",
        }
    }

    pub fn ruta(self) -> &'static str {
        match self {
            Self::Todas => "/cartas",
            Self::Recibidas => "/cartas/recibidas",
            Self::Asignadas => "/cartas/asignadas",
            Self::Pendientes => "/cartas/pendientes",
            Self::Emitidas => "/cartas/emitidas",
        }
    }

    /// API collection behind the list. Area inboxes have none for a user
    /// without an area.
    pub fn api_path(self, area: Option<Id>) -> Option<String> {
        match self {
            Self::Todas => Some("cards".to_string()),
            Self::Recibidas => Some("cards/received".to_string()),
            Self::Emitidas => Some("cards/emitidos".to_string()),
            Self::Asignadas => area.map(|a| format!("cards/assigned/{a}")),
            Self::Pendientes => area.map(|a| format!("cards/pending/{a}")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "searchBy")]
    pub search_by: Option<String>,
    pub estado: Option<String>,
    pub msg: Option<String>,
    pub error: Option<String>,
}

fn search_fields() -> Vec<SelectOption> {
    vec![
        SelectOption::new("asunto", "Asunto"),
        SelectOption::new("codigoRecibido", "Código recibido"),
        SelectOption::new("codigoEnviado", "Código enviado"),
        SelectOption::new("empresa", "Empresa"),
    ]
}

fn estados() -> Vec<SelectOption> {
    Estado::CONOCIDOS
        .iter()
        .map(|e| SelectOption::new(e.as_str(), e.label()))
        .collect()
}

async fn listar(
    state: SharedState,
    session: Session,
    q: ListQuery,
    bandeja: Bandeja,
) -> Result<Html<String>, WebError> {
    let query = PageQuery::new(q.page.unwrap_or(1), state.page_size)
        .search(q.search.as_deref(), q.search_by.as_deref())
        .filter("estado", q.estado.as_deref().unwrap_or_default());

    let area = session.profile.area_id();
    let page = match bandeja.api_path(area) {
        Some(path) => {
            let (api, query) = (&session.api, &query);
            state
                .cache
                .get_or_fetch(&session.cache_key(query.cache_key(&path)), move || async move {
                    match bandeja {
                        Bandeja::Todas => api.list::<Cartas>(query).await,
                        Bandeja::Recibidas => api.received(query).await,
                        Bandeja::Emitidas => api.emitidos(query).await,
                        Bandeja::Asignadas => api.assigned(area.unwrap_or_default(), query).await,
                        Bandeja::Pendientes => api.pending(area.unwrap_or_default(), query).await,
                    }
                })
                .await?
        }
        None => {
            debug!("{} has no area; {} is empty", session.profile.email, bandeja.ruta());
            Paginated::empty(state.page_size)
        }
    };

    let pager = Pager::from_meta(
        &page.meta,
        filters([
            ("search", q.search.as_deref()),
            ("searchBy", q.search_by.as_deref()),
            ("estado", q.estado.as_deref()),
        ]),
    );

    Ok(views::render(
        "cartas.html",
        context! {
            session => session.view(),
            titulo => bandeja.titulo(),
            path => bandeja.ruta(),
            rows => CartaRow::many(&page.data, hoy()),
            pager => pager,
            search => q.search,
            search_by => q.search_by.unwrap_or_else(|| "asunto".to_string()),
            search_fields => search_fields(),
            estado => q.estado,
            estados => estados(),
            msg => q.msg,
            error => q.error,
        },
    )?)
}

pub async fn todas(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    listar(state, session, q, Bandeja::Todas).await
}

pub async fn recibidas(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    listar(state, session, q, Bandeja::Recibidas).await
}

pub async fn asignadas(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    listar(state, session, q, Bandeja::Asignadas).await
}

pub async fn pendientes(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    listar(state, session, q, Bandeja::Pendientes).await
}

pub async fn emitidas(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    listar(state, session, q, Bandeja::Emitidas).await
}

// -- Uploads --

pub(crate) struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf"
            || self.file_name.to_lowercase().ends_with(".pdf")
    }
}

/// Text fields plus the optional `archivo` file of a multipart form.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<Upload>), WebError> {
    let mut fields = HashMap::new();
    let mut archivo = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "archivo" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| WebError::BadRequest(e.to_string()))?;
            // Browsers send an empty part when no file was picked.
            if !file_name.is_empty() && !bytes.is_empty() {
                archivo = Some(Upload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| WebError::BadRequest(e.to_string()))?;
            fields.insert(name, value);
        }
    }
    Ok((fields, archivo))
}

/// Check the attachment and stand its name in for `pdfInfo` until the real
/// upload returns the stored name.
fn attach(form: &mut FormData, archivo: Option<Upload>, errors: &mut FieldErrors) -> Option<Upload> {
    match archivo {
        Some(upload) if upload.is_pdf() => {
            form.insert("pdfInfo", upload.file_name.clone());
            Some(upload)
        }
        Some(_) => {
            errors.add("archivo", "El archivo debe ser un PDF");
            None
        }
        None => {
            errors.add("archivo", "Adjunte el PDF de la carta");
            None
        }
    }
}

fn submitted(fields: &HashMap<String, String>) -> Values {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

// -- Registration --

fn recibida_fields() -> Vec<Field> {
    vec![
        Field::text("codigoRecibido", "Código de recepción").required(),
        Field::text("asunto", "Asunto").required(),
        Field::new("resumen", "Resumen", Kind::Textarea),
        Field::new("fechaIngreso", "Fecha de ingreso", Kind::Date),
        Field::select("empresaId", "Empresa remitente", Source::Empresas).required(),
        Field::select("destinatarioId", "Destinatario", Source::Destinatarios),
        Field::new("esConfidencial", "Confidencial", Kind::Checkbox),
    ]
}

async fn nueva_page(
    state: &SharedState,
    session: &Session,
    values: Values,
    errors: &FieldErrors,
    alert: Option<String>,
) -> Result<Html<String>, WebError> {
    let mut fields = recibida_fields();
    forms::load_options(state, &session.api, &mut fields).await?;
    Ok(views::render(
        "carta_nueva.html",
        context! {
            session => session.view(),
            fields => fields,
            values => values,
            errors => errors,
            error => alert,
        },
    )?)
}

/// GET /cartas/nueva
pub async fn nueva(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, WebError> {
    let initial = values([("fechaIngreso", Some(hoy().format("%Y-%m-%d").to_string()))]);
    nueva_page(&state, &session, initial, &FieldErrors::new(), None).await
}

/// POST /cartas/nueva: Upload the PDF, then register the letter under the
/// stored file name.
pub async fn crear(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let (fields, archivo) = read_multipart(multipart).await?;
    let values = submitted(&fields);
    let mut form = FormData::from(fields);
    let mut errors = FieldErrors::new();
    let archivo = attach(&mut form, archivo, &mut errors);

    let (mut input, archivo) = match (form.parse::<CartaRecibidaInput>(Modo::Crear), archivo) {
        (Ok(input), Some(archivo)) => (input, archivo),
        (parsed, _) => {
            errors.merge(parsed.err().unwrap_or_default());
            return Ok(nueva_page(&state, &session, values, &errors, None)
                .await?
                .into_response());
        }
    };

    let registered = async {
        let stored = session
            .api
            .upload(&archivo.file_name, &archivo.content_type, archivo.bytes)
            .await?;
        input.pdf_info = stored.file_name;
        session.api.registrar(input).await
    };

    match registered.await {
        Ok(carta) => {
            state.invalidate::<Cartas>().await;
            let msg = format!("Carta {} registrada", carta.codigo());
            Ok(Redirect::to(&flash(&format!("/cartas/{}", carta.id), "msg", &msg)).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => Ok(nueva_page(&state, &session, values, &FieldErrors::new(), Some(e.to_string()))
            .await?
            .into_response()),
    }
}

// -- Detail --

fn asignar_fields() -> Vec<Field> {
    vec![
        Field::select("areaResponsableId", "Área responsable", Source::Areas).required(),
        Field::select("subAreaId", "Subárea", Source::SubAreas),
        Field::select("temaId", "Tema", Source::Temas).required(),
        Field::select("nivelImpacto", "Nivel de impacto", Source::NivelImpacto),
        Field::new("vencimiento", "Vencimiento", Kind::Date),
        Field::new("esConfidencial", "Confidencial", Kind::Checkbox),
        Field::text("correosCopia", "Correos en copia (separados por coma)"),
    ]
}

fn responder_fields() -> Vec<Field> {
    vec![
        Field::text("codigoEnviado", "Código de envío"),
        Field::text("asunto", "Asunto").required(),
        Field::new("resumen", "Resumen", Kind::Textarea),
        Field::new("fechaEnvio", "Fecha de envío", Kind::Date),
        Field::select("empresaId", "Empresa destinataria", Source::Empresas),
        Field::select("destinatarioId", "Firmante", Source::Destinatarios),
    ]
}

fn iso(carta_date: Option<chrono::DateTime<chrono::Utc>>) -> Option<String> {
    carta_date.map(|ts| fecha_local(ts).format("%Y-%m-%d").to_string())
}

fn id_value(id: Option<Id>) -> Option<String> {
    id.map(|id| id.to_string())
}

fn asignar_values(carta: &Carta) -> Values {
    let correos = (!carta.correos_copia.is_empty()).then(|| carta.correos_copia.join(", "));
    values([
        ("areaResponsableId", id_value(carta.area_responsable_id)),
        ("subAreaId", id_value(carta.sub_area_id)),
        ("temaId", id_value(carta.tema_id)),
        ("nivelImpacto", carta.nivel_impacto.clone()),
        ("vencimiento", iso(carta.vencimiento)),
        ("esConfidencial", checked(carta.es_confidencial)),
        ("correosCopia", correos),
    ])
}

fn responder_values(carta: &Carta) -> Values {
    values([
        ("asunto", Some(format!("Re: {}", carta.asunto))),
        ("fechaEnvio", Some(hoy().format("%Y-%m-%d").to_string())),
        ("empresaId", id_value(carta.empresa_id)),
    ])
}

#[derive(Debug, Default, Deserialize)]
pub struct DetalleQuery {
    pub msg: Option<String>,
    pub error: Option<String>,
}

/// Form state to re-render the detail page with after a failed submission.
#[derive(Default)]
struct Detalle {
    asignar: Option<(Values, FieldErrors)>,
    responder: Option<(Values, FieldErrors)>,
    msg: Option<String>,
    error: Option<String>,
}

async fn detalle_page(
    state: &SharedState,
    session: &Session,
    id: Id,
    forms_state: Detalle,
) -> Result<Html<String>, WebError> {
    let emitidas = state
        .cache
        .get_or_fetch(&session.cache_key(format!("{}/emitidos#all", Cartas::PATH)), || {
            session.api.emitidas_all()
        })
        .await?;
    let traza = session.api.trazabilidad_con(id, emitidas).await?;
    let carta = traza.actual();
    let hoy = hoy();

    let mut asignar = asignar_fields();
    let mut responder = responder_fields();
    forms::load_options(state, &session.api, &mut asignar).await?;
    forms::load_options(state, &session.api, &mut responder).await?;

    let (asignar_values, asignar_errors) = forms_state
        .asignar
        .unwrap_or_else(|| (asignar_values(carta), FieldErrors::new()));
    let (responder_values, responder_errors) = forms_state
        .responder
        .unwrap_or_else(|| (responder_values(carta), FieldErrors::new()));
    let hilo: Vec<CartaRow> = traza.hilo().into_iter().map(|c| CartaRow::new(c, hoy)).collect();

    Ok(views::render(
        "carta_detalle.html",
        context! {
            session => session.view(),
            carta => CartaRow::new(carta, hoy),
            resumen => carta.resumen.clone(),
            tema => carta.tema.as_ref().map(|t| t.nombre.clone()),
            nivel_impacto => carta.nivel_impacto.clone(),
            correos_copia => carta.correos_copia.clone(),
            fecha_ingreso_iso => iso(carta.fecha_ingreso),
            cerrada => Estado::from_option(carta.estado.as_deref()).is_some_and(|e| e.is_closed()),
            hilo => hilo,
            asignar_fields => asignar,
            asignar_values => asignar_values,
            asignar_errors => asignar_errors,
            responder_fields => responder,
            responder_values => responder_values,
            responder_errors => responder_errors,
            msg => forms_state.msg,
            error => forms_state.error,
        },
    )?)
}

/// GET /cartas/{id}
pub async fn detalle(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
    Query(q): Query<DetalleQuery>,
) -> Result<Html<String>, WebError> {
    let forms_state = Detalle {
        msg: q.msg,
        error: q.error,
        ..Default::default()
    };
    detalle_page(&state, &session, id, forms_state).await
}

/// Redirect back to the detail page after a successful mutation, or render
/// the API's complaint in the alert box.
async fn after_mutation(
    state: &SharedState,
    session: &Session,
    id: Id,
    result: Result<String, ApiError>,
    retry: Detalle,
) -> Result<Response, WebError> {
    match result {
        Ok(msg) => {
            state.invalidate::<Cartas>().await;
            Ok(Redirect::to(&flash(&format!("/cartas/{id}"), "msg", &msg)).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            let retry = Detalle {
                error: Some(e.to_string()),
                ..retry
            };
            Ok(detalle_page(state, session, id, retry).await?.into_response())
        }
    }
}

/// POST /cartas/{id}/asignar
pub async fn asignar(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    let values = submitted(&fields);
    let input = match FormData::from(fields).parse::<AsignacionInput>(Modo::Editar) {
        Ok(input) => input,
        Err(errors) => {
            let retry = Detalle {
                asignar: Some((values, errors)),
                ..Default::default()
            };
            return Ok(detalle_page(&state, &session, id, retry).await?.into_response());
        }
    };

    let result = session
        .api
        .assign(id, &input)
        .await
        .map(|_| "Carta asignada".to_string());
    let retry = Detalle {
        asignar: Some((values, FieldErrors::new())),
        ..Default::default()
    };
    after_mutation(&state, &session, id, result, retry).await
}

/// POST /cartas/{id}/responder: Upload the answer's PDF and emit it.
pub async fn responder(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let (fields, archivo) = read_multipart(multipart).await?;
    let values = submitted(&fields);
    let mut form = FormData::from(fields);
    let mut errors = FieldErrors::new();
    let archivo = attach(&mut form, archivo, &mut errors);

    let (mut input, archivo) = match (form.parse::<RespuestaInput>(Modo::Crear), archivo) {
        (Ok(input), Some(archivo)) => (input, archivo),
        (parsed, _) => {
            errors.merge(parsed.err().unwrap_or_default());
            let retry = Detalle {
                responder: Some((values, errors)),
                ..Default::default()
            };
            return Ok(detalle_page(&state, &session, id, retry).await?.into_response());
        }
    };

    let emitted = async {
        let stored = session
            .api
            .upload(&archivo.file_name, &archivo.content_type, archivo.bytes)
            .await?;
        input.pdf_info = stored.file_name;
        session.api.respond(id, input).await
    };
    let result = emitted.await.map(|carta| {
        info!("{} answered carta {} with {}", session.profile.email, id, carta.id);
        format!("Respuesta {} emitida", carta.codigo())
    });
    let retry = Detalle {
        responder: Some((values, FieldErrors::new())),
        ..Default::default()
    };
    after_mutation(&state, &session, id, result, retry).await
}

/// POST /cartas/{id}/cerrar
pub async fn cerrar(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
) -> Result<Response, WebError> {
    let result = session
        .api
        .close(id)
        .await
        .map(|_| "Carta cerrada".to_string());
    after_mutation(&state, &session, id, result, Detalle::default()).await
}
