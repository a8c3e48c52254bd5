use bytes::Bytes;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::info;

use cartas_types::api::UploadResponse;

use crate::{ApiClient, ApiError};

/// 20 MB, the largest PDF the dashboard forwards.
pub const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;

impl ApiClient {
    /// Upload a file as the multipart field `file`.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<UploadResponse, ApiError> {
        if bytes.is_empty() {
            return Err(ApiError::Backend {
                status: 400,
                message: "El archivo está vacío".into(),
            });
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(ApiError::Backend {
                status: 413,
                message: "El archivo excede el tamaño máximo de 20 MB".into(),
            });
        }

        let size = bytes.len();
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let res: UploadResponse = self
            .send(self.request(Method::POST, "fileupload/file").multipart(form))
            .await?;
        info!("Uploaded {} ({} bytes) as {}", file_name, size, res.file_name);
        Ok(res)
    }
}

/// Resolve a stored file reference to a download URL.
///
/// References are file names relative to `files_base`; absolute URLs (such as
/// an upload's `secureUrl`) pass through untouched.
pub fn download_url(files_base: &str, file_ref: &str) -> String {
    let file_ref = file_ref.trim();
    if file_ref.starts_with("http://") || file_ref.starts_with("https://") {
        return file_ref.to_string();
    }
    format!(
        "{}/{}",
        files_base.trim_end_matches('/'),
        file_ref.trim_start_matches('/')
    )
}
