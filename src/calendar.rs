// Calendar and list presentation of the event list.
use crate::filter::{self, TimeBuckets, TypeFilter};
use crate::model::{Event, EventType};
use crate::time_utils;
use chrono::{DateTime, NaiveDate, TimeZone};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Calendar,
    List,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Calendar => Self::List,
            Self::List => Self::Calendar,
        }
    }
}

/// Every distinct date with at least one event, ascending.
///
/// Computed from the unfiltered list: the date picker flags days with any
/// event regardless of the active type filters.
pub fn marker_dates<'a, I>(events: I) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().map(|e| e.date).collect()
}

/// Events whose date equals the local calendar day of `selected`, original order kept.
pub fn events_on_date<'a, I, Tz>(events: I, selected: &DateTime<Tz>) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
    Tz: TimeZone,
{
    let key = time_utils::local_date_key(selected);
    events
        .into_iter()
        .filter(|e| time_utils::date_key(e.date) == key)
        .collect()
}

/// View state of the events page over an already-fetched list.
///
/// Switching modes, filters or the selected day never refetches; every view
/// is re-derived from `events`.
#[derive(Debug, Clone, Default)]
pub struct CalendarView {
    events: Vec<Event>,
    filters: TypeFilter,
    selected: Option<NaiveDate>,
    mode: ViewMode,
}

impl CalendarView {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn set_events(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn toggle_mode(&mut self) -> ViewMode {
        self.mode = self.mode.toggled();
        self.mode
    }

    pub fn filters(&self) -> &TypeFilter {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: TypeFilter) {
        self.filters = filters;
    }

    pub fn toggle_type(&mut self, ty: EventType) {
        self.filters.toggle(ty);
    }

    /// Selected day; defaults to the viewer's local today.
    pub fn selected_date(&self) -> NaiveDate {
        self.selected.unwrap_or_else(time_utils::local_today)
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected = Some(date);
    }

    /// Selects the local calendar day of `instant`.
    pub fn select_instant<Tz: TimeZone>(&mut self, instant: &DateTime<Tz>) {
        self.selected = Some(instant.date_naive());
    }

    pub fn filtered(&self) -> Vec<&Event> {
        filter::apply_type_filter(&self.events, &self.filters)
    }

    pub fn marker_dates(&self) -> BTreeSet<NaiveDate> {
        marker_dates(&self.events)
    }

    /// Filtered events on the selected day.
    pub fn selected_events(&self) -> Vec<&Event> {
        let day = self.selected_date();
        self.filtered()
            .into_iter()
            .filter(|e| e.date == day)
            .collect()
    }

    /// Filtered events split around `today`.
    pub fn buckets(&self, today: NaiveDate) -> TimeBuckets<'_> {
        filter::partition_by_time(self.filtered(), today)
    }

    pub fn find(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }
}
