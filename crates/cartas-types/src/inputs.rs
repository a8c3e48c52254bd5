//! Payloads sent to the API on create/update.
//!
//! Optional fields are left out of the JSON when absent so a PATCH only
//! touches what the form filled in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Id;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAreaInput {
    pub nombre: String,
    pub area_responsable_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmpresaInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direccion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinatarioInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_responsable_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemaInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_responsable_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsuarioInput {
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    pub email: String,
    /// Required on creation; an update without it keeps the current password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub rol_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_responsable_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_area_id: Option<Id>,
    pub activo: bool,
}

/// Registers an incoming letter. `pdf_info` is the file name returned by the
/// upload endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartaRecibidaInput {
    pub codigo_recibido: String,
    pub asunto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_ingreso: Option<NaiveDate>,
    pub empresa_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinatario_id: Option<Id>,
    pub pdf_info: String,
    pub es_confidencial: bool,
}

/// Routes a received letter to an area and sets its deadline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsignacionInput {
    pub area_responsable_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_area_id: Option<Id>,
    pub tema_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nivel_impacto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vencimiento: Option<NaiveDate>,
    pub es_confidencial: bool,
    #[serde(default)]
    pub correos_copia: Vec<String>,
    /// Entry date of the letter being assigned; only used to check the deadline.
    #[serde(skip)]
    pub fecha_ingreso: Option<NaiveDate>,
}

/// An outgoing letter answering an existing one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespuestaInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_enviado: Option<String>,
    pub asunto: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_envio: Option<NaiveDate>,
    pub pdf_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_responsable_id: Option<Id>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destinatario_id: Option<Id>,
    pub carta_anterior: Option<Id>,
    pub emitido: bool,
}

/// Partial update of a letter's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstadoInput {
    pub estado: String,
}

/// Any card mutation goes through the `cards` resource; the variants share
/// one input type so the resource stays generic.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CartaInput {
    Recibida(CartaRecibidaInput),
    Respuesta(RespuestaInput),
    Estado(EstadoInput),
}
