// File: ./src/model/mod.rs
pub mod event;
pub mod gallery;
pub mod officer;

pub use event::{Event, EventDraft, EventType};
pub use gallery::{GalleryDraft, GalleryImage};
pub use officer::{Officer, OfficerDraft};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A record type managed through the admin dashboard.
///
/// Ties the record to its REST collection and to the payload used to create
/// or update it.
pub trait Resource: Clone + std::fmt::Debug + DeserializeOwned + Send + Sync + 'static {
    type Draft: Clone + std::fmt::Debug + PartialEq + Serialize + Send + Sync + 'static;

    /// Path segment under `/api`, e.g. `events`.
    const COLLECTION: &'static str;
    /// Singular noun used in user-facing messages.
    const NOUN: &'static str;
    /// Whether the backend accepts `PUT /api/<collection>/<id>`.
    const UPDATABLE: bool = true;

    fn id(&self) -> &str;

    fn to_draft(&self) -> Self::Draft;

    /// Form contents for a brand new record, given the records already listed.
    fn blank_draft(existing: &[Self]) -> Self::Draft;

    /// Client-side checks run before a draft is sent.
    fn validate(_draft: &Self::Draft) -> Result<(), String> {
        Ok(())
    }
}

/// Stable sort by 1-based display order; equal orders keep their listed order.
pub fn sort_by_display_order<T, F>(items: &mut [T], order: F)
where
    F: Fn(&T) -> i32,
{
    items.sort_by_key(order);
}
