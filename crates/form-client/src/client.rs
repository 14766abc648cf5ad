use std::time::Duration;

use form_spec::{FileHandle, FormVersion, PartBody, PayloadEncoding, SubmissionPayload};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::upload::FileUploader;

/// Thin HTTP client for the form API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct FormClient {
    http: Client,
    config: ApiConfig,
}

impl FormClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `GET {base}/form-versions/{id}`, unwrapping a `{data: ...}` envelope.
    pub async fn fetch_version(&self, version_id: u64) -> Result<FormVersion, ClientError> {
        let url = self.config.version_url(version_id);
        tracing::debug!(%url, "fetching form version");
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let body = read_json(response).await?;
        Ok(FormVersion::from_response(body)?)
    }

    /// Posts the visible-field payload, as JSON or multipart depending on
    /// whether it carries files.
    pub async fn submit(
        &self,
        version_id: u64,
        payload: &SubmissionPayload,
    ) -> Result<(), ClientError> {
        let url = self.config.submissions_url(version_id);
        let encoding = payload.encoding();
        tracing::debug!(%url, fields = payload.len(), ?encoding, "submitting form");
        let request = match encoding {
            PayloadEncoding::Json => self
                .http
                .post(&url)
                .header(ACCEPT, "application/json")
                .json(&payload.to_json()),
            PayloadEncoding::Multipart => self.http.post(&url).multipart(multipart_form(payload).await?),
        };
        let response = request.send().await?;
        ensure_success(&response)?;
        Ok(())
    }
}

impl FileUploader for FormClient {
    /// `POST {base}/form-versions/{id}/uploads` with `field_id` and `file`
    /// parts. The server answers `{id}` or `{data: {id}}`.
    async fn upload(
        &self,
        version_id: u64,
        field_id: &str,
        file: &FileHandle,
    ) -> Result<String, ClientError> {
        let url = self.config.uploads_url(version_id);
        tracing::debug!(%url, field = field_id, file = %file.name, "uploading file");
        let form = Form::new()
            .text("field_id", field_id.to_string())
            .part("file", file_part(file).await?);
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await?;
        let body = read_json(response).await?;
        upload_id(&body).ok_or(ClientError::MissingUploadId)
    }
}

fn ensure_success(response: &Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        tracing::warn!(status = status.as_u16(), url = %response.url(), "request rejected");
        Err(ClientError::Status {
            status: status.as_u16(),
        })
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    ensure_success(&response)?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn multipart_form(payload: &SubmissionPayload) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in payload.multipart_parts() {
        form = match part.body {
            PartBody::Text(text) => form.text(part.name, text),
            PartBody::File(handle) => form.part(part.name, file_part(&handle).await?),
        };
    }
    Ok(form)
}

async fn file_part(handle: &FileHandle) -> Result<Part, ClientError> {
    let bytes = tokio::fs::read(handle.path())
        .await
        .map_err(|source| ClientError::File {
            path: handle.path.clone(),
            source,
        })?;
    let part = Part::bytes(bytes).file_name(handle.name.clone());
    match &handle.content_type {
        Some(content_type) => Ok(part.mime_str(content_type)?),
        None => Ok(part),
    }
}

fn upload_id(body: &Value) -> Option<String> {
    let record = body.get("data").unwrap_or(body);
    match record.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_id_accepts_both_envelopes() {
        assert_eq!(upload_id(&json!({ "id": "abc" })).as_deref(), Some("abc"));
        assert_eq!(upload_id(&json!({ "data": { "id": 42 } })).as_deref(), Some("42"));
        assert_eq!(upload_id(&json!({ "data": { "name": "x" } })), None);
        assert_eq!(upload_id(&json!({ "id": "" })), None);
    }
}
