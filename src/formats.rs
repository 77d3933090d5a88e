use serde::{Deserialize, Serialize};

/// One saved (or already present) page image, as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub index: usize,
    pub filename: String,
    pub url: String,
    pub size: u64,
}

/// Contents of `.chapter.json`, the hand-off file for downstream tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterManifest {
    pub label: String,
    pub site: String,
    #[serde(rename = "titleId")]
    pub title_id: Option<String>,
    pub no: Option<String>,
    pub episode_title: Option<String>,
    pub episode_title_main: Option<String>,
    pub episode_subtitle: Option<String>,
    pub episode_no_extracted: Option<String>,
    pub url: String,
    pub count: usize,
    pub images: Vec<ImageRecord>,
}

/// One image's worth of OCR/translation output, as dumped by the external OCR tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub items: Vec<OcrItem>,
}

impl OcrRecord {
    pub fn image_key(&self) -> &str {
        self.image_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or(self.image.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<String>,
}
