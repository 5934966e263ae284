use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    #[serde(default)]
    pub pathname: Option<String>,
}
