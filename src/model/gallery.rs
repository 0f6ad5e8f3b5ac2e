// File: ./src/model/gallery.rs
use crate::model::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GalleryDraft {
    pub url: String,
    pub caption: String,
    pub order: i32,
}

impl Resource for GalleryImage {
    type Draft = GalleryDraft;

    const COLLECTION: &'static str = "gallery";
    const NOUN: &'static str = "image";
    // Images are added and removed, never edited in place.
    const UPDATABLE: bool = false;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> GalleryDraft {
        GalleryDraft {
            url: self.url.clone(),
            caption: self.caption.clone(),
            order: self.order,
        }
    }

    fn blank_draft(existing: &[Self]) -> GalleryDraft {
        GalleryDraft {
            order: existing.len() as i32 + 1,
            ..GalleryDraft::default()
        }
    }

    fn validate(draft: &GalleryDraft) -> Result<(), String> {
        if draft.url.trim().is_empty() {
            return Err("Image URL is required".to_string());
        }
        Ok(())
    }
}
