// File: src/site.rs
//! Public pages of the site, built from the REST backend.
//!
//! Fetch failures on these pages are never fatal: the affected section is
//! rendered empty and the failure is logged.
use crate::calendar::CalendarView;
use crate::client::{ApiClient, ApiError};
use crate::config::Config;
use crate::filter::{self, TimeBuckets};
use crate::loader::ViewLoader;
use crate::model::{Event, GalleryImage, Officer, sort_by_display_order};
use crate::time_utils::{self, TimeError};
use chrono::NaiveDate;
use std::collections::BTreeSet;

fn or_degraded<T>(what: &str, result: Result<Vec<T>, ApiError>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Error fetching {}: {}", what, e);
            Vec::new()
        }
    }
}

// --- HOME ---

#[derive(Debug, Clone, Default)]
pub struct HomeView {
    events: Vec<Event>,
    gallery: Vec<GalleryImage>,
    preview_len: usize,
}

impl HomeView {
    /// Fetches events and gallery concurrently; each degrades on its own.
    pub async fn load(client: &ApiClient, config: &Config) -> Self {
        let (events, gallery) = futures::join!(client.list_events(), client.list_gallery());
        let mut gallery = or_degraded("gallery", gallery);
        sort_by_display_order(&mut gallery, |g| g.order);
        Self {
            events: or_degraded("events", events),
            gallery,
            preview_len: config.preview_upcoming,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The next few events from `today` on, regardless of type.
    pub fn upcoming_preview(&self, today: NaiveDate) -> Vec<&Event> {
        filter::partition_by_time(&self.events, today)
            .upcoming_preview(self.preview_len)
            .to_vec()
    }

    pub fn gallery(&self) -> &[GalleryImage] {
        &self.gallery
    }
}

// --- EVENTS ---

/// List presentation: upcoming in full, past capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView<'a> {
    pub upcoming: Vec<&'a Event>,
    pub past: Vec<&'a Event>,
}

/// Calendar presentation for the selected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay<'a> {
    pub markers: BTreeSet<NaiveDate>,
    pub selected: NaiveDate,
    pub events: Vec<&'a Event>,
}

#[derive(Debug)]
pub struct EventsPage {
    client: ApiClient,
    loader: ViewLoader<Result<Vec<Event>, ApiError>>,
    view: CalendarView,
    past_shown: usize,
}

impl EventsPage {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            client,
            loader: ViewLoader::new(),
            view: CalendarView::default(),
            past_shown: config.preview_past,
        }
    }

    /// Creates the page and waits for its first fetch.
    pub async fn load(client: ApiClient, config: &Config) -> Self {
        let mut page = Self::new(client, config);
        page.refresh();
        page.settle().await;
        page
    }

    /// Starts a fetch, superseding any fetch still in flight.
    pub fn refresh(&mut self) {
        let client = self.client.clone();
        self.loader.start(async move { client.list_events().await });
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Applies the pending fetch, if any. Returns whether a result was applied.
    pub async fn settle(&mut self) -> bool {
        match self.loader.next().await {
            Some(result) => {
                self.view.set_events(or_degraded("events", result));
                true
            }
            None => false,
        }
    }

    /// Drops any in-flight fetch without applying it.
    pub fn dismiss(&mut self) {
        self.loader.cancel();
    }

    pub fn view(&self) -> &CalendarView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CalendarView {
        &mut self.view
    }

    pub fn list_view(&self, today: NaiveDate) -> ListView<'_> {
        let TimeBuckets { upcoming, mut past } = self.view.buckets(today);
        past.truncate(self.past_shown);
        ListView { upcoming, past }
    }

    pub fn calendar_day(&self) -> CalendarDay<'_> {
        CalendarDay {
            markers: self.view.marker_dates(),
            selected: self.view.selected_date(),
            events: self.view.selected_events(),
        }
    }

    /// Add-to-calendar link for a loaded event; `None` if the id is unknown.
    pub fn calendar_link(&self, id: &str) -> Option<Result<String, TimeError>> {
        self.view.find(id).map(time_utils::calendar_link)
    }
}

// --- PEOPLE ---

#[derive(Debug, Clone, Default)]
pub struct PeopleDirectory {
    officers: Vec<Officer>,
}

impl PeopleDirectory {
    pub async fn load(client: &ApiClient) -> Self {
        Self::from_officers(or_degraded("people", client.list_officers().await))
    }

    pub fn from_officers(mut officers: Vec<Officer>) -> Self {
        sort_by_display_order(&mut officers, |o| o.order);
        Self { officers }
    }

    pub fn officers(&self) -> &[Officer] {
        &self.officers
    }

    pub fn is_empty(&self) -> bool {
        self.officers.is_empty()
    }
}

// --- GALLERY ---

#[derive(Debug, Clone, Default)]
pub struct GalleryView {
    images: Vec<GalleryImage>,
}

impl GalleryView {
    pub async fn load(client: &ApiClient) -> Self {
        Self::from_images(or_degraded("gallery", client.list_gallery().await))
    }

    pub fn from_images(mut images: Vec<GalleryImage>) -> Self {
        sort_by_display_order(&mut images, |g| g.order);
        Self { images }
    }

    pub fn images(&self) -> &[GalleryImage] {
        &self.images
    }
}
