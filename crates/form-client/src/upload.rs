use std::future::Future;

use form_spec::{Field, FieldValue, FileHandle, FormSession};
use futures::future::{join_all, try_join_all};

use crate::error::ClientError;

/// Stores one file on the server and returns its identifier.
///
/// Implemented by [`crate::FormClient`]; tests and embedders can provide
/// their own.
pub trait FileUploader: Send + Sync {
    fn upload(
        &self,
        version_id: u64,
        field_id: &str,
        file: &FileHandle,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// Uploads every file held by `value` and returns the field's new value:
/// the identifier for single-file fields, the ordered identifiers for
/// multi-file fields.
///
/// Files larger than the field's `max_size_mb` are rejected before any
/// request is made.
pub async fn upload_field<U: FileUploader>(
    uploader: &U,
    version_id: u64,
    field: &Field,
    value: &FieldValue,
) -> Result<FieldValue, ClientError> {
    let files = value.files();
    if let Some(limit) = field.max_size_bytes() {
        for file in &files {
            check_size(file, limit).await?;
        }
    }

    let ids = try_join_all(
        files
            .iter()
            .map(|file| uploader.upload(version_id, &field.id, file)),
    )
    .await?;

    let multiple = field.is_multiple() || matches!(value, FieldValue::List(_));
    Ok(if multiple {
        FieldValue::List(ids.into_iter().map(FieldValue::Text).collect())
    } else {
        ids.into_iter()
            .next()
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Null)
    })
}

/// Uploads the files of every visible file-valued field concurrently and
/// records each outcome on the session. A failing field does not stop the
/// others. Returns the ids of the fields that failed.
pub async fn upload_session_files<U: FileUploader>(
    uploader: &U,
    session: &mut FormSession,
) -> Vec<String> {
    let version_id = session.version().id;
    let visible = session.visible_fields();
    let pending: Vec<(Field, FieldValue)> = session
        .fields()
        .filter(|field| visible.contains(&field.id))
        .filter_map(|field| {
            session
                .value(&field.id)
                .filter(|value| value.has_files())
                .map(|value| (field.clone(), value.clone()))
        })
        .collect();

    let outcomes = join_all(pending.iter().map(|(field, value)| async move {
        let outcome = upload_field(uploader, version_id, field, value).await;
        (field.id.clone(), outcome)
    }))
    .await;

    let mut failed = Vec::new();
    for (field_id, outcome) in outcomes {
        match outcome {
            Ok(value) => session.record_upload(&field_id, Ok(value)),
            Err(err) => {
                session.record_upload(&field_id, Err(err.to_string()));
                failed.push(field_id);
            }
        }
    }
    failed
}

async fn check_size(file: &FileHandle, limit: u64) -> Result<(), ClientError> {
    let metadata = tokio::fs::metadata(file.path())
        .await
        .map_err(|source| ClientError::File {
            path: file.path.clone(),
            source,
        })?;
    if metadata.len() > limit {
        return Err(ClientError::FileTooLarge {
            name: file.name.clone(),
            size: metadata.len(),
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use form_spec::FormVersion;
    use serde_json::json;

    use super::*;

    /// Hands out ids derived from the file name and fails on names
    /// starting with "bad".
    #[derive(Default)]
    struct FakeUploader {
        calls: Mutex<BTreeMap<String, usize>>,
    }

    impl FileUploader for FakeUploader {
        async fn upload(
            &self,
            _version_id: u64,
            field_id: &str,
            file: &FileHandle,
        ) -> Result<String, ClientError> {
            *self
                .calls
                .lock()
                .expect("lock")
                .entry(field_id.to_string())
                .or_default() += 1;
            if file.name.starts_with("bad") {
                Err(ClientError::Status { status: 500 })
            } else {
                Ok(format!("id-{}", file.name))
            }
        }
    }

    fn version() -> FormVersion {
        FormVersion::from_response(json!({
            "id": 9,
            "schema": { "sections": [{
                "title": "Files",
                "fields": [
                    { "id": "cv", "type": "file", "label": "CV" },
                    { "id": "gallery", "type": "image", "label": "Gallery", "props": { "multiple": true } },
                    { "id": "avatar", "type": "image", "label": "Avatar", "props": { "max_size_mb": 0.000001 } }
                ]
            }]}
        }))
        .expect("version")
    }

    #[tokio::test]
    async fn multi_file_field_keeps_order() {
        let version = version();
        let field = version.field("gallery").expect("field");
        let value = FieldValue::List(vec![
            FieldValue::File(FileHandle::new("/tmp/one.png")),
            FieldValue::File(FileHandle::new("/tmp/two.png")),
        ]);
        let uploaded = upload_field(&FakeUploader::default(), 9, field, &value)
            .await
            .expect("upload");
        assert_eq!(uploaded, FieldValue::from(vec!["id-one.png", "id-two.png"]));
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_upload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.png");
        std::fs::write(&path, vec![0u8; 64]).expect("write");

        let version = version();
        let field = version.field("avatar").expect("field");
        let uploader = FakeUploader::default();
        let err = upload_field(&uploader, 9, field, &FieldValue::File(FileHandle::new(&path)))
            .await
            .expect_err("too large");
        assert!(matches!(err, ClientError::FileTooLarge { size: 64, .. }));
        assert!(uploader.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn session_uploads_record_each_field_independently() {
        let mut session = FormSession::new(version());
        session.set_value("cv", FieldValue::File(FileHandle::new("/tmp/cv.pdf")));
        session.set_value("gallery", FieldValue::File(FileHandle::new("/tmp/bad.png")));

        let failed = upload_session_files(&FakeUploader::default(), &mut session).await;
        assert_eq!(failed, vec!["gallery".to_string()]);
        assert_eq!(session.value("cv"), Some(&FieldValue::text("id-cv.pdf")));
        assert_eq!(session.value("gallery"), Some(&FieldValue::Null));
        assert_eq!(session.error("gallery"), Some("Request failed with status 500"));
    }
}
