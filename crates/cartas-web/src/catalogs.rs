//! Administration pages for the reference catalogs.
//!
//! Every catalog gets the same six handlers, generic over [`Catalog`]; a
//! catalog only describes its table columns, its form fields and how a stored
//! record maps back onto the form.

use std::collections::HashMap;

use axum::{
    Extension, Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use tracing::info;

use cartas_client::{
    Areas, Destinatarios, Empresas, PageQuery, Resource, Roles, SubAreas, Temas, Usuarios,
};
use cartas_tracking::{FieldErrors, FormData, FromForm, Modo, Validate};
use cartas_types::Id;
use cartas_types::models::{Area, Destinatario, Empresa, Rol, SubArea, Tema, Usuario};

use crate::error::WebError;
use crate::forms::{self, Field, Kind, Source, Values, checked, values};
use crate::session::Session;
use crate::state::SharedState;
use crate::views::{self, Pager, filters, flash};

pub trait Catalog: Resource<Input: FromForm + Validate> + Send + Sync + 'static {
    /// URL segment under `/admin`.
    const SLUG: &'static str;
    const TITLE: &'static str;
    const SINGULAR: &'static str;

    fn columns() -> &'static [&'static str];
    fn id(item: &Self::Item) -> Id;
    fn cells(item: &Self::Item) -> Vec<String>;
    fn fields(modo: Modo) -> Vec<Field>;
    fn values(item: &Self::Item) -> Values;

    /// Values a blank create form starts with.
    fn initial() -> Values {
        Values::new()
    }
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn id_value(id: Option<Id>) -> Option<String> {
    id.map(|id| id.to_string())
}

impl Catalog for Areas {
    const SLUG: &'static str = "areas";
    const TITLE: &'static str = "Áreas responsables";
    const SINGULAR: &'static str = "área";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Descripción"]
    }

    fn id(item: &Area) -> Id {
        item.id
    }

    fn cells(item: &Area) -> Vec<String> {
        vec![item.nombre.clone(), opt(&item.descripcion)]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::new("descripcion", "Descripción", Kind::Textarea),
        ]
    }

    fn values(item: &Area) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("descripcion", item.descripcion.clone()),
        ])
    }
}

impl Catalog for SubAreas {
    const SLUG: &'static str = "subareas";
    const TITLE: &'static str = "Subáreas";
    const SINGULAR: &'static str = "subárea";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Área"]
    }

    fn id(item: &SubArea) -> Id {
        item.id
    }

    fn cells(item: &SubArea) -> Vec<String> {
        vec![
            item.nombre.clone(),
            item.area_responsable
                .as_ref()
                .map(|a| a.nombre.clone())
                .unwrap_or_default(),
        ]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::select("areaResponsableId", "Área responsable", Source::Areas).required(),
        ]
    }

    fn values(item: &SubArea) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            (
                "areaResponsableId",
                id_value(
                    item.area_responsable_id
                        .or(item.area_responsable.as_ref().map(|a| a.id)),
                ),
            ),
        ])
    }
}

impl Catalog for Empresas {
    const SLUG: &'static str = "empresas";
    const TITLE: &'static str = "Empresas";
    const SINGULAR: &'static str = "empresa";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "RUC", "Teléfono", "Correo"]
    }

    fn id(item: &Empresa) -> Id {
        item.id
    }

    fn cells(item: &Empresa) -> Vec<String> {
        vec![
            item.nombre.clone(),
            opt(&item.ruc),
            opt(&item.telefono),
            opt(&item.correo),
        ]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::text("ruc", "RUC"),
            Field::text("direccion", "Dirección"),
            Field::text("telefono", "Teléfono"),
            Field::new("correo", "Correo", Kind::Email),
        ]
    }

    fn values(item: &Empresa) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("ruc", item.ruc.clone()),
            ("direccion", item.direccion.clone()),
            ("telefono", item.telefono.clone()),
            ("correo", item.correo.clone()),
        ])
    }
}

impl Catalog for Roles {
    const SLUG: &'static str = "roles";
    const TITLE: &'static str = "Roles";
    const SINGULAR: &'static str = "rol";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Descripción"]
    }

    fn id(item: &Rol) -> Id {
        item.id
    }

    fn cells(item: &Rol) -> Vec<String> {
        vec![item.nombre.clone(), opt(&item.descripcion)]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::new("descripcion", "Descripción", Kind::Textarea),
        ]
    }

    fn values(item: &Rol) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("descripcion", item.descripcion.clone()),
        ])
    }
}

impl Catalog for Destinatarios {
    const SLUG: &'static str = "destinatarios";
    const TITLE: &'static str = "Destinatarios";
    const SINGULAR: &'static str = "destinatario";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Cargo", "Correo"]
    }

    fn id(item: &Destinatario) -> Id {
        item.id
    }

    fn cells(item: &Destinatario) -> Vec<String> {
        vec![item.nombre.clone(), opt(&item.cargo), opt(&item.correo)]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::text("cargo", "Cargo"),
            Field::new("correo", "Correo", Kind::Email),
            Field::select("areaResponsableId", "Área responsable", Source::Areas),
        ]
    }

    fn values(item: &Destinatario) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("cargo", item.cargo.clone()),
            ("correo", item.correo.clone()),
            ("areaResponsableId", id_value(item.area_responsable_id)),
        ])
    }
}

impl Catalog for Temas {
    const SLUG: &'static str = "temas";
    const TITLE: &'static str = "Temas";
    const SINGULAR: &'static str = "tema";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Descripción"]
    }

    fn id(item: &Tema) -> Id {
        item.id
    }

    fn cells(item: &Tema) -> Vec<String> {
        vec![item.nombre.clone(), opt(&item.descripcion)]
    }

    fn fields(_modo: Modo) -> Vec<Field> {
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::new("descripcion", "Descripción", Kind::Textarea),
            Field::select("areaResponsableId", "Área responsable", Source::Areas),
        ]
    }

    fn values(item: &Tema) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("descripcion", item.descripcion.clone()),
            ("areaResponsableId", id_value(item.area_responsable_id)),
        ])
    }
}

impl Catalog for Usuarios {
    const SLUG: &'static str = "usuarios";
    const TITLE: &'static str = "Usuarios";
    const SINGULAR: &'static str = "usuario";

    fn columns() -> &'static [&'static str] {
        &["Nombre", "Correo", "Rol", "Área", "Activo"]
    }

    fn id(item: &Usuario) -> Id {
        item.id
    }

    fn cells(item: &Usuario) -> Vec<String> {
        vec![
            item.nombre_completo(),
            item.email.clone(),
            item.rol.as_ref().map(|r| r.nombre.clone()).unwrap_or_default(),
            item.area_responsable
                .as_ref()
                .map(|a| a.nombre.clone())
                .unwrap_or_default(),
            if item.activo { "Sí" } else { "No" }.to_string(),
        ]
    }

    fn fields(modo: Modo) -> Vec<Field> {
        let mut password = Field::new("password", "Contraseña", Kind::Password);
        if modo == Modo::Crear {
            password = password.required();
        }
        vec![
            Field::text("nombre", "Nombre").required(),
            Field::text("apellido", "Apellido"),
            Field::new("email", "Correo", Kind::Email).required(),
            password,
            Field::select("rolId", "Rol", Source::Roles).required(),
            Field::select("areaResponsableId", "Área responsable", Source::Areas),
            Field::select("subAreaId", "Subárea", Source::SubAreas),
            Field::new("activo", "Activo", Kind::Checkbox),
        ]
    }

    fn values(item: &Usuario) -> Values {
        values([
            ("nombre", Some(item.nombre.clone())),
            ("apellido", item.apellido.clone()),
            ("email", Some(item.email.clone())),
            ("rolId", id_value(item.rol_id.or(item.rol.as_ref().map(|r| r.id)))),
            ("areaResponsableId", id_value(item.area_responsable_id)),
            ("subAreaId", id_value(item.sub_area_id)),
            ("activo", checked(item.activo)),
        ])
    }

    fn initial() -> Values {
        values([("activo", checked(true))])
    }
}

/// Routes for one catalog, meant to be nested under `/admin/{slug}`.
pub fn routes<C: Catalog>() -> Router<SharedState> {
    Router::new()
        .route("/", get(list::<C>))
        .route("/nuevo", get(new::<C>).post(create::<C>))
        .route("/{id}/editar", get(edit::<C>).post(update::<C>))
        .route("/{id}/eliminar", post(delete::<C>))
}

/// Every catalog's routes, nested under `/admin`.
pub fn admin_routes() -> Router<SharedState> {
    Router::new()
        .nest(&format!("/{}", Areas::SLUG), routes::<Areas>())
        .nest(&format!("/{}", SubAreas::SLUG), routes::<SubAreas>())
        .nest(&format!("/{}", Empresas::SLUG), routes::<Empresas>())
        .nest(&format!("/{}", Roles::SLUG), routes::<Roles>())
        .nest(&format!("/{}", Destinatarios::SLUG), routes::<Destinatarios>())
        .nest(&format!("/{}", Temas::SLUG), routes::<Temas>())
        .nest(&format!("/{}", Usuarios::SLUG), routes::<Usuarios>())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub msg: Option<String>,
    pub error: Option<String>,
}

#[derive(Serialize)]
struct Row {
    id: Id,
    cells: Vec<String>,
}

async fn list<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Query(q): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    session.require_admin()?;

    let query = PageQuery::new(q.page.unwrap_or(1), state.page_size).search(q.search.as_deref(), None);
    let page = state
        .cache
        .get_or_fetch(&session.cache_key(query.cache_key(C::PATH)), || session.api.list::<C>(&query))
        .await?;

    let rows: Vec<Row> = page
        .data
        .iter()
        .map(|item| Row {
            id: C::id(item),
            cells: C::cells(item),
        })
        .collect();
    let pager = Pager::from_meta(&page.meta, filters([("search", q.search.as_deref())]));

    Ok(views::render(
        "catalogo.html",
        context! {
            session => session.view(),
            titulo => C::TITLE,
            singular => C::SINGULAR,
            slug => C::SLUG,
            columns => C::columns(),
            rows => rows,
            search => q.search,
            pager => pager,
            msg => q.msg,
            error => q.error,
        },
    )?)
}

/// Render the create/edit form with whatever the user typed and any errors.
async fn form_page<C: Catalog>(
    state: &SharedState,
    session: &Session,
    id: Option<Id>,
    values: Values,
    errors: &FieldErrors,
    alert: Option<String>,
) -> Result<Html<String>, WebError> {
    let modo = if id.is_some() { Modo::Editar } else { Modo::Crear };
    let mut fields = C::fields(modo);
    forms::load_options(state, &session.api, &mut fields).await?;

    let (titulo, action) = match id {
        Some(id) => (
            format!("Editar {}", C::SINGULAR),
            format!("/admin/{}/{}/editar", C::SLUG, id),
        ),
        None => (
            format!("Nuevo {}", C::SINGULAR),
            format!("/admin/{}/nuevo", C::SLUG),
        ),
    };

    Ok(views::render(
        "catalogo_form.html",
        context! {
            session => session.view(),
            titulo => titulo,
            slug => C::SLUG,
            action => action,
            fields => fields,
            values => values,
            errors => errors,
            error => alert,
        },
    )?)
}

async fn new<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
) -> Result<Html<String>, WebError> {
    session.require_admin()?;
    form_page::<C>(&state, &session, None, C::initial(), &FieldErrors::new(), None).await
}

async fn edit<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
) -> Result<Html<String>, WebError> {
    session.require_admin()?;
    let item = session.api.get::<C>(id).await?;
    form_page::<C>(&state, &session, Some(id), C::values(&item), &FieldErrors::new(), None).await
}

async fn create<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    session.require_admin()?;
    save::<C>(state, session, None, fields).await
}

async fn update<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Response, WebError> {
    session.require_admin()?;
    save::<C>(state, session, Some(id), fields).await
}

async fn save<C: Catalog>(
    state: SharedState,
    session: Session,
    id: Option<Id>,
    fields: HashMap<String, String>,
) -> Result<Response, WebError> {
    let submitted: Values = fields
        .iter()
        .filter(|(k, _)| k.as_str() != "password")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let form = FormData::from(fields);
    let modo = if id.is_some() { Modo::Editar } else { Modo::Crear };

    let input = match form.parse::<C::Input>(modo) {
        Ok(input) => input,
        Err(errors) => {
            let page = form_page::<C>(&state, &session, id, submitted, &errors, None).await?;
            return Ok(page.into_response());
        }
    };

    let result = match id {
        Some(id) => session.api.update::<C>(id, &input).await.map(|item| (id, item)),
        None => session
            .api
            .create::<C>(&input)
            .await
            .map(|item| (C::id(&item), item)),
    };

    match result {
        Ok((saved, _)) => {
            info!("{} {} guardado por {}", C::SINGULAR, saved, session.profile.email);
            state.invalidate::<C>().await;
            let msg = format!("{} guardado correctamente", capitalize(C::SINGULAR));
            Ok(Redirect::to(&flash(&format!("/admin/{}", C::SLUG), "msg", &msg)).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            let page = form_page::<C>(
                &state,
                &session,
                id,
                submitted,
                &FieldErrors::new(),
                Some(e.to_string()),
            )
            .await?;
            Ok(page.into_response())
        }
    }
}

async fn delete<C: Catalog>(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Id>,
) -> Result<Redirect, WebError> {
    session.require_admin()?;
    let target = match session.api.delete::<C>(id).await {
        Ok(()) => {
            info!("{} {} eliminado por {}", C::SINGULAR, id, session.profile.email);
            state.invalidate::<C>().await;
            let msg = format!("{} eliminado", capitalize(C::SINGULAR));
            flash(&format!("/admin/{}", C::SLUG), "msg", &msg)
        }
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => flash(&format!("/admin/{}", C::SLUG), "error", &e.to_string()),
    };
    Ok(Redirect::to(&target))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_handles_accents() {
        assert_eq!(capitalize("área"), "Área");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn user_password_is_required_only_on_create() {
        let crear = Usuarios::fields(Modo::Crear);
        let editar = Usuarios::fields(Modo::Editar);
        let password = |fields: &[Field]| fields.iter().find(|f| f.name == "password").map(|f| f.required);
        assert_eq!(password(&crear), Some(true));
        assert_eq!(password(&editar), Some(false));
    }

    #[test]
    fn stored_record_maps_back_to_form() {
        let usuario: Usuario = serde_json::from_value(serde_json::json!({
            "id": 4,
            "nombre": "Ana",
            "email": "ana@example.com",
            "rol": { "id": 2, "nombre": "Analista" },
            "areaResponsableId": 3,
            "activo": false
        }))
        .unwrap();
        let v = Usuarios::values(&usuario);
        assert_eq!(v["rolId"], "2");
        assert_eq!(v["areaResponsableId"], "3");
        assert!(!v.contains_key("activo"));
        assert!(!v.contains_key("password"));
    }

    #[test]
    fn new_user_starts_active() {
        assert_eq!(Usuarios::initial()["activo"], "on");
        assert!(Areas::initial().is_empty());
    }
}
