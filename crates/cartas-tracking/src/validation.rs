//! Form parsing and validation.
//!
//! Forms arrive url-encoded with the API's camelCase field names. [`FormData`]
//! turns them into typed input payloads, and [`Validate`] checks the payload
//! before it is sent, so the API only sees well-formed requests.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use cartas_types::Id;
use cartas_types::inputs::{
    AreaInput, AsignacionInput, CartaRecibidaInput, DestinatarioInput, EmpresaInput,
    RespuestaInput, RolInput, SubAreaInput, TemaInput, UsuarioInput,
};

pub const REQUIRED: &str = "Campo obligatorio";
pub const INVALID_NUMBER: &str = "Debe ser un número";
pub const INVALID_DATE: &str = "Fecha inválida (AAAA-MM-DD)";
pub const INVALID_EMAIL: &str = "Correo electrónico inválido";

/// Field name → message, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[error("{} campo(s) con errores", .0.len())]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.0.entry(field).or_insert(message);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn require_text(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, REQUIRED);
        }
    }

    fn require<T>(&mut self, field: &str, value: &Option<T>) {
        if value.is_none() {
            self.add(field, REQUIRED);
        }
    }
}

/// Whether a form creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modo {
    Crear,
    Editar,
}

pub trait Validate {
    fn validate(&self, modo: Modo) -> Result<(), FieldErrors>;
}

/// Raw url-encoded form fields. Values are trimmed and blank values count as
/// absent.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl From<HashMap<String, String>> for FormData {
    fn from(fields: HashMap<String, String>) -> Self {
        Self { fields }
    }
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// The raw value as typed, for echoing back into a re-rendered form.
    pub fn raw(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Text or an empty string; required-ness is checked by [`Validate`].
    pub fn string(&self, field: &str) -> String {
        self.text(field).unwrap_or_default()
    }

    pub fn id(&self, field: &str, errors: &mut FieldErrors) -> Option<Id> {
        let raw = self.text(field)?;
        match raw.parse::<Id>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(field, INVALID_NUMBER);
                None
            }
        }
    }

    pub fn date(&self, field: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
        let raw = self.text(field)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add(field, INVALID_DATE);
                None
            }
        }
    }

    /// Checkbox semantics: present with a truthy value.
    pub fn flag(&self, field: &str) -> bool {
        matches!(
            self.text(field).as_deref().map(str::to_lowercase).as_deref(),
            Some("on" | "true" | "1" | "si" | "sí")
        )
    }

    /// Comma, semicolon or whitespace separated list.
    pub fn list(&self, field: &str) -> Vec<String> {
        self.text(field)
            .map(|raw| {
                raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parse and validate in one step, reporting parse and validation errors
    /// together.
    pub fn parse<T>(&self, modo: Modo) -> Result<T, FieldErrors>
    where
        T: FromForm + Validate,
    {
        let mut errors = FieldErrors::new();
        let value = T::from_form(self, &mut errors);
        if let Err(validation) = value.validate(modo) {
            errors.merge(validation);
        }
        errors.into_result().map(|()| value)
    }
}

/// Builds an input payload from form fields. Unparsable values are recorded
/// in `errors` and left empty.
pub trait FromForm: Sized {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self;
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    };
    if !value.is_empty() && !valid {
        errors.add(field, INVALID_EMAIL);
    }
}

// -- Catalogs --

impl FromForm for AreaInput {
    fn from_form(form: &FormData, _errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            descripcion: form.text("descripcion"),
        }
    }
}

impl Validate for AreaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        errors.into_result()
    }
}

impl FromForm for SubAreaInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            area_responsable_id: form.id("areaResponsableId", errors),
        }
    }
}

impl Validate for SubAreaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        errors.require("areaResponsableId", &self.area_responsable_id);
        errors.into_result()
    }
}

impl FromForm for EmpresaInput {
    fn from_form(form: &FormData, _errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            ruc: form.text("ruc"),
            direccion: form.text("direccion"),
            telefono: form.text("telefono"),
            correo: form.text("correo"),
        }
    }
}

impl Validate for EmpresaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        if let Some(correo) = &self.correo {
            check_email(&mut errors, "correo", correo);
        }
        if let Some(ruc) = &self.ruc {
            if !ruc.chars().all(|c| c.is_ascii_digit()) {
                errors.add("ruc", INVALID_NUMBER);
            }
        }
        errors.into_result()
    }
}

impl FromForm for RolInput {
    fn from_form(form: &FormData, _errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            descripcion: form.text("descripcion"),
        }
    }
}

impl Validate for RolInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        errors.into_result()
    }
}

impl FromForm for DestinatarioInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            correo: form.text("correo"),
            cargo: form.text("cargo"),
            area_responsable_id: form.id("areaResponsableId", errors),
        }
    }
}

impl Validate for DestinatarioInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        if let Some(correo) = &self.correo {
            check_email(&mut errors, "correo", correo);
        }
        errors.into_result()
    }
}

impl FromForm for TemaInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            descripcion: form.text("descripcion"),
            area_responsable_id: form.id("areaResponsableId", errors),
        }
    }
}

impl Validate for TemaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        errors.into_result()
    }
}

impl FromForm for UsuarioInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            nombre: form.string("nombre"),
            apellido: form.text("apellido"),
            email: form.string("email"),
            password: form.text("password"),
            rol_id: form.id("rolId", errors),
            area_responsable_id: form.id("areaResponsableId", errors),
            sub_area_id: form.id("subAreaId", errors),
            activo: form.flag("activo"),
        }
    }
}

impl Validate for UsuarioInput {
    fn validate(&self, modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("nombre", &self.nombre);
        errors.require_text("email", &self.email);
        check_email(&mut errors, "email", &self.email);
        errors.require("rolId", &self.rol_id);
        match (&self.password, modo) {
            (None, Modo::Crear) => errors.add("password", REQUIRED),
            (Some(password), _) if password.chars().count() < 6 => {
                errors.add("password", "Debe tener al menos 6 caracteres")
            }
            _ => {}
        }
        errors.into_result()
    }
}

// -- Correspondence --

impl FromForm for CartaRecibidaInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            codigo_recibido: form.string("codigoRecibido"),
            asunto: form.string("asunto"),
            resumen: form.text("resumen"),
            fecha_ingreso: form.date("fechaIngreso", errors),
            empresa_id: form.id("empresaId", errors),
            destinatario_id: form.id("destinatarioId", errors),
            pdf_info: form.string("pdfInfo"),
            es_confidencial: form.flag("esConfidencial"),
        }
    }
}

impl Validate for CartaRecibidaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("codigoRecibido", &self.codigo_recibido);
        errors.require_text("asunto", &self.asunto);
        errors.require("empresaId", &self.empresa_id);
        errors.require_text("pdfInfo", &self.pdf_info);
        errors.into_result()
    }
}

impl FromForm for AsignacionInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            area_responsable_id: form.id("areaResponsableId", errors),
            sub_area_id: form.id("subAreaId", errors),
            tema_id: form.id("temaId", errors),
            nivel_impacto: form.text("nivelImpacto"),
            vencimiento: form.date("vencimiento", errors),
            es_confidencial: form.flag("esConfidencial"),
            correos_copia: form.list("correosCopia"),
            fecha_ingreso: form.date("fechaIngreso", errors),
        }
    }
}

impl Validate for AsignacionInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("areaResponsableId", &self.area_responsable_id);
        errors.require("temaId", &self.tema_id);
        if let (Some(vencimiento), Some(ingreso)) = (self.vencimiento, self.fecha_ingreso) {
            if vencimiento < ingreso {
                errors.add(
                    "vencimiento",
                    "El vencimiento no puede ser anterior a la fecha de ingreso",
                );
            }
        }
        if let Some(nivel) = &self.nivel_impacto {
            if !matches!(nivel.as_str(), "Alto" | "Medio" | "Bajo") {
                errors.add("nivelImpacto", "Nivel de impacto desconocido");
            }
        }
        for correo in &self.correos_copia {
            check_email(&mut errors, "correosCopia", correo);
        }
        errors.into_result()
    }
}

impl FromForm for RespuestaInput {
    fn from_form(form: &FormData, errors: &mut FieldErrors) -> Self {
        Self {
            codigo_enviado: form.text("codigoEnviado"),
            asunto: form.string("asunto"),
            resumen: form.text("resumen"),
            fecha_envio: form.date("fechaEnvio", errors),
            pdf_info: form.string("pdfInfo"),
            empresa_id: form.id("empresaId", errors),
            area_responsable_id: form.id("areaResponsableId", errors),
            destinatario_id: form.id("destinatarioId", errors),
            carta_anterior: form.id("cartaAnterior", errors),
            emitido: true,
        }
    }
}

impl Validate for RespuestaInput {
    fn validate(&self, _modo: Modo) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require_text("asunto", &self.asunto);
        errors.require_text("pdfInfo", &self.pdf_info);
        errors.into_result()
    }
}
