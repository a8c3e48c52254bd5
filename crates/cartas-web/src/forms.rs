//! Form field descriptions shared by the letter and catalog pages.

use std::collections::BTreeMap;

use serde::Serialize;

use cartas_client::{
    ApiClient, ApiError, Areas, Destinatarios, Empresas, Resource, Roles, SubAreas, Temas,
};

use crate::state::{AppState, SelectOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Text,
    Email,
    Password,
    Textarea,
    Date,
    Checkbox,
    Select,
}

/// Catalog a select box is filled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Areas,
    SubAreas,
    Empresas,
    Roles,
    Destinatarios,
    Temas,
    NivelImpacto,
}

#[derive(Debug, Clone, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: Kind,
    pub required: bool,
    pub options: Vec<SelectOption>,
    #[serde(skip)]
    pub source: Option<Source>,
}

impl Field {
    pub fn new(name: &'static str, label: &'static str, kind: Kind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            options: Vec::new(),
            source: None,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, Kind::Text)
    }

    pub fn select(name: &'static str, label: &'static str, source: Source) -> Self {
        Self {
            source: Some(source),
            ..Self::new(name, label, Kind::Select)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Submitted or stored values keyed by field name, as the form shows them.
pub type Values = BTreeMap<String, String>;

pub fn values<I, K>(pairs: I) -> Values
where
    I: IntoIterator<Item = (K, Option<String>)>,
    K: Into<String>,
{
    pairs
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.into(), v)))
        .collect()
}

pub fn checked(on: bool) -> Option<String> {
    on.then(|| "on".to_string())
}

async fn options<R, F>(
    state: &AppState,
    api: &ApiClient,
    label: F,
) -> Result<Vec<SelectOption>, ApiError>
where
    R: Resource,
    F: Fn(&R::Item) -> SelectOption,
{
    Ok(state.all::<R>(api).await?.iter().map(label).collect())
}

/// Fill every select box from its catalog.
pub async fn load_options(
    state: &AppState,
    api: &ApiClient,
    fields: &mut [Field],
) -> Result<(), ApiError> {
    for field in fields.iter_mut() {
        let Some(source) = field.source else {
            continue;
        };
        field.options = match source {
            Source::Areas => options::<Areas, _>(state, api, |a| SelectOption::new(a.id, &a.nombre)).await?,
            Source::SubAreas => {
                options::<SubAreas, _>(state, api, |s| {
                    let label = match &s.area_responsable {
                        Some(area) => format!("{} ({})", s.nombre, area.nombre),
                        None => s.nombre.clone(),
                    };
                    SelectOption::new(s.id, label)
                })
                .await?
            }
            Source::Empresas => options::<Empresas, _>(state, api, |e| SelectOption::new(e.id, &e.nombre)).await?,
            Source::Roles => options::<Roles, _>(state, api, |r| SelectOption::new(r.id, &r.nombre)).await?,
            Source::Destinatarios => {
                options::<Destinatarios, _>(state, api, |d| SelectOption::new(d.id, &d.nombre)).await?
            }
            Source::Temas => options::<Temas, _>(state, api, |t| SelectOption::new(t.id, &t.nombre)).await?,
            Source::NivelImpacto => ["Alto", "Medio", "Bajo"]
                .into_iter()
                .map(|n| SelectOption::new(n, n))
                .collect(),
        };
    }
    Ok(())
}
