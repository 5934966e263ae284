use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAppearance {
    #[serde(default)]
    pub background_image: Option<String>,
    pub overlay_opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontPreference {
    pub font: String,
}
