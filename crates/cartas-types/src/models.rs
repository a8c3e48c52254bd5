//! Records mirrored from the correspondence API.
//!
//! These are transport types: the API owns their lifecycle, the dashboard only
//! reads them and sends inputs back. Every optional field defaults so that a
//! partially populated relation (e.g. `areaResponsable: { id, nombre }`) still
//! decodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubArea {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
    #[serde(default)]
    pub area_responsable: Option<Area>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Empresa {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub correo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rol {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destinatario {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub cargo: Option<String>,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tema {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usuario {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub apellido: Option<String>,
    pub email: String,
    #[serde(default)]
    pub rol_id: Option<Id>,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
    #[serde(default)]
    pub sub_area_id: Option<Id>,
    #[serde(default = "default_true")]
    pub activo: bool,
    #[serde(default)]
    pub rol: Option<Rol>,
    #[serde(default)]
    pub area_responsable: Option<Area>,
    #[serde(default)]
    pub sub_area: Option<SubArea>,
}

impl Usuario {
    pub fn nombre_completo(&self) -> String {
        match self.apellido.as_deref().map(str::trim) {
            Some(apellido) if !apellido.is_empty() => format!("{} {}", self.nombre, apellido),
            _ => self.nombre.clone(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A tracked letter. Received letters carry `codigoRecibido`; letters emitted
/// in response carry `codigoEnviado` and point at the letter they answer
/// through `cartaAnterior`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carta {
    pub id: Id,
    #[serde(default)]
    pub codigo_recibido: Option<String>,
    #[serde(default)]
    pub codigo_enviado: Option<String>,
    #[serde(default)]
    pub asunto: String,
    #[serde(default)]
    pub resumen: Option<String>,
    #[serde(default)]
    pub fecha_ingreso: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fecha_envio: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vencimiento: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub nivel_impacto: Option<String>,
    #[serde(default)]
    pub es_confidencial: bool,
    #[serde(default)]
    pub emitido: bool,
    #[serde(default)]
    pub devuelto: bool,
    #[serde(default)]
    pub pdf_info: Option<String>,
    #[serde(default)]
    pub pdf_respuesta: Option<String>,
    #[serde(default)]
    pub correos_copia: Vec<String>,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
    #[serde(default)]
    pub sub_area_id: Option<Id>,
    #[serde(default)]
    pub empresa_id: Option<Id>,
    #[serde(default)]
    pub tema_id: Option<Id>,
    #[serde(default)]
    pub destinatario_id: Option<Id>,
    #[serde(default)]
    pub carta_anterior: Option<Id>,
    #[serde(default)]
    pub area_responsable: Option<Area>,
    #[serde(default)]
    pub sub_area: Option<SubArea>,
    #[serde(default)]
    pub empresa: Option<Empresa>,
    #[serde(default)]
    pub tema: Option<Tema>,
    #[serde(default)]
    pub destinatario: Option<Destinatario>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Carta {
    /// The code shown in tables: the received code for incoming letters,
    /// the emitted code for outgoing ones.
    pub fn codigo(&self) -> &str {
        let code = if self.emitido {
            self.codigo_enviado.as_deref().or(self.codigo_recibido.as_deref())
        } else {
            self.codigo_recibido.as_deref().or(self.codigo_enviado.as_deref())
        };
        code.unwrap_or("")
    }

    pub fn empresa_nombre(&self) -> Option<&str> {
        self.empresa.as_ref().map(|e| e.nombre.as_str())
    }

    pub fn area_nombre(&self) -> Option<&str> {
        self.area_responsable.as_ref().map(|a| a.nombre.as_str())
    }

    /// Date used to order a thread: sent date for emitted letters, then
    /// entry date, then creation.
    pub fn fecha_referencia(&self) -> Option<DateTime<Utc>> {
        self.fecha_envio.or(self.fecha_ingreso).or(self.created_at)
    }
}
