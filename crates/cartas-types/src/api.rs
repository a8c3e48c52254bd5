use serde::{Deserialize, Serialize};

use crate::Id;
use crate::models::{Area, Rol, SubArea};

// -- Auth --

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(alias = "access_token", alias = "accessToken")]
    pub token: String,
}

/// The authenticated user as returned by `auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Id,
    pub nombre: String,
    #[serde(default)]
    pub apellido: Option<String>,
    pub email: String,
    #[serde(default)]
    pub rol: Option<Rol>,
    #[serde(default)]
    pub area_responsable_id: Option<Id>,
    #[serde(default)]
    pub sub_area_id: Option<Id>,
    #[serde(default)]
    pub area_responsable: Option<Area>,
    #[serde(default)]
    pub sub_area: Option<SubArea>,
}

impl Profile {
    /// Area the user works in, from the flat id or the nested relation.
    pub fn area_id(&self) -> Option<Id> {
        self.area_responsable_id
            .or_else(|| self.area_responsable.as_ref().map(|a| a.id))
    }

    pub fn rol_nombre(&self) -> &str {
        self.rol.as_ref().map(|r| r.nombre.as_str()).unwrap_or("")
    }

    /// Administrator roles may manage the catalogs.
    pub fn is_admin(&self) -> bool {
        let rol = self.rol_nombre().trim().to_lowercase();
        rol == "admin" || rol == "administrador" || rol == "superadmin"
    }
}

// -- Pagination --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Meta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    #[serde(alias = "lastPage")]
    pub last_page: u32,
}

impl<T> Paginated<T> {
    pub fn empty(limit: u32) -> Self {
        Self {
            data: Vec::new(),
            meta: Meta {
                total: 0,
                page: 1,
                limit,
                last_page: 0,
            },
        }
    }
}

// -- Files --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub secure_url: String,
    pub file_name: String,
}

// -- Errors --

/// Error body returned by the API on 4xx/5xx responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<ErrorMessage>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

/// Validation failures arrive as a list of messages, everything else as one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

impl ErrorMessage {
    pub fn joined(&self) -> String {
        match self {
            Self::One(message) => message.clone(),
            Self::Many(messages) => messages.join("; "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_accepts_access_token() {
        let res: LoginResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(res.token, "abc");
        let res: LoginResponse = serde_json::from_str(r#"{"token": "xyz"}"#).unwrap();
        assert_eq!(res.token, "xyz");
    }

    #[test]
    fn error_message_joins_lists() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message": ["nombre should not be empty", "email must be an email"], "error": "Bad Request", "statusCode": 400}"#,
        )
        .unwrap();
        assert_eq!(
            body.message.unwrap().joined(),
            "nombre should not be empty; email must be an email"
        );
        assert_eq!(body.status_code, Some(400));
    }

    #[test]
    fn profile_admin_detection() {
        let profile: Profile = serde_json::from_str(
            r#"{"id": 1, "nombre": "Root", "email": "root@example.com", "rol": {"id": 1, "nombre": "Administrador"}, "areaResponsable": {"id": 4, "nombre": "Gerencia"}}"#,
        )
        .unwrap();
        assert!(profile.is_admin());
        assert_eq!(profile.area_id(), Some(4));
    }

    #[test]
    fn paginated_envelope_decodes() {
        let page: Paginated<crate::models::Rol> = serde_json::from_str(
            r#"{"data": [{"id": 1, "nombre": "Admin"}], "meta": {"total": 11, "page": 2, "limit": 10, "last_page": 2}}"#,
        )
        .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.last_page, 2);
    }
}
