// File: ./src/model/officer.rs
use crate::model::Resource;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OfficerDraft {
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image_url: String,
    pub email: Option<String>,
    pub order: i32,
}

impl Resource for Officer {
    type Draft = OfficerDraft;

    const COLLECTION: &'static str = "officers";
    const NOUN: &'static str = "officer";

    fn id(&self) -> &str {
        &self.id
    }

    fn to_draft(&self) -> OfficerDraft {
        OfficerDraft {
            name: self.name.clone(),
            role: self.role.clone(),
            bio: self.bio.clone(),
            image_url: self.image_url.clone(),
            email: self.email.clone().filter(|e| !e.trim().is_empty()),
            order: self.order,
        }
    }

    fn blank_draft(existing: &[Self]) -> OfficerDraft {
        OfficerDraft {
            order: existing.len() as i32 + 1,
            ..OfficerDraft::default()
        }
    }

    fn validate(draft: &OfficerDraft) -> Result<(), String> {
        if draft.name.trim().is_empty() || draft.role.trim().is_empty() {
            return Err("Name and role are required".to_string());
        }
        Ok(())
    }
}
