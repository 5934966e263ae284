pub mod dto;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_CONTENT_TYPE: &str = "application/pdf";

/// Raw file bytes as handed over by a file picker.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn pdf(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            bytes,
        }
    }

    /// Builds an upload from a base64 payload, as sent by API clients.
    pub fn from_base64(
        file_name: impl Into<String>,
        content_type: Option<String>,
        data: &str,
    ) -> Result<Self, AppError> {
        // tolerate a full data URL
        let payload = data.split_once(";base64,").map(|(_, p)| p).unwrap_or(data);
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| AppError::validation(format!("file data is not valid base64: {}", e)))?;
        Ok(Self {
            file_name: file_name.into(),
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            bytes,
        })
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::validation("file is empty"));
        }
        Ok(())
    }
}

/// Turns an uploaded file into something that can be stored in a PDF's `url`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store(&self, upload: &FileUpload) -> Result<String, AppError>;
}

/// Keeps the file inside the tree itself as a `data:` URL.
pub struct EmbeddedBlobStore;

#[async_trait]
impl BlobStore for EmbeddedBlobStore {
    async fn store(&self, upload: &FileUpload) -> Result<String, AppError> {
        upload.validate()?;
        Ok(format!(
            "data:{};base64,{}",
            upload.content_type,
            STANDARD.encode(&upload.bytes)
        ))
    }
}

#[derive(Clone, Debug)]
pub struct BlobConfig {
    pub endpoint: String,
    pub token: String,
}

/// Uploads to a hosted blob endpoint that answers `PUT <endpoint>/<name>`
/// with `{ "url": ... }`.
pub struct HttpBlobStore {
    client: Client,
    config: BlobConfig,
}

impl HttpBlobStore {
    pub fn new(config: BlobConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn object_name(file_name: &str) -> String {
        let safe: String = file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '-' })
            .collect();
        let safe = safe.trim_matches('-');
        let safe = if safe.is_empty() { "file.pdf" } else { safe };
        format!("{}-{}", Uuid::new_v4(), safe)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn store(&self, upload: &FileUpload) -> Result<String, AppError> {
        upload.validate()?;

        let url = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            Self::object_name(&upload.file_name)
        );

        let response = self.client
            .put(&url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", upload.content_type.as_str())
            .body(upload.bytes.clone())
            .send()
            .await
            .map_err(|e| AppError::UploadFailed(format!("request to blob store failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::UploadFailed(format!("blob store returned {}: {}", status, body)));
        }

        let parsed: dto::UploadResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::UploadFailed(format!("unexpected blob store response: {}", e)))?;
        tracing::info!(
            "uploaded {} ({} bytes) as {}",
            upload.file_name,
            upload.bytes.len(),
            parsed.pathname.as_deref().unwrap_or(&parsed.url)
        );

        Ok(parsed.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedded_store_builds_data_url() {
        let upload = FileUpload::pdf("notes.pdf", b"%PDF-1.4".to_vec());
        let url = EmbeddedBlobStore.store(&upload).await.unwrap();
        assert_eq!(url, "data:application/pdf;base64,JVBERi0xLjQ=");
    }

    #[tokio::test]
    async fn test_embedded_store_rejects_empty_file() {
        let upload = FileUpload::pdf("empty.pdf", Vec::new());
        assert!(matches!(
            EmbeddedBlobStore.store(&upload).await,
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_from_base64_accepts_data_url() {
        let upload =
            FileUpload::from_base64("a.pdf", None, "data:application/pdf;base64,JVBERi0xLjQ=").unwrap();
        assert_eq!(upload.bytes, b"%PDF-1.4");
        assert!(FileUpload::from_base64("a.pdf", None, "not base64!").is_err());
    }

    #[test]
    fn test_object_name_is_url_safe() {
        let name = HttpBlobStore::object_name("Lecture 1 (final).pdf");
        assert!(name.ends_with("Lecture-1--final-.pdf"));
        assert!(!name.contains(' '));
    }
}
