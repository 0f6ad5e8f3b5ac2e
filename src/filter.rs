// File: src/filter.rs
//! Type and time filtering over an already-fetched event list.
//!
//! Nothing here mutates events. Every function returns borrowed, ordered
//! views and leaves slicing for previews to the caller.
use crate::model::{Event, EventType};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Past events surfaced by the list view.
pub const PAST_EVENTS_SHOWN: usize = 5;
/// Upcoming events surfaced by preview contexts (home page).
pub const UPCOMING_PREVIEW_LEN: usize = 3;

/// Which event types are visible. All types are visible by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilter {
    enabled: BTreeMap<EventType, bool>,
}

impl Default for TypeFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl TypeFilter {
    pub fn all() -> Self {
        Self {
            enabled: EventType::iter().map(|t| (t, true)).collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            enabled: EventType::iter().map(|t| (t, false)).collect(),
        }
    }

    /// Only the given types are visible.
    pub fn only<I>(types: I) -> Self
    where
        I: IntoIterator<Item = EventType>,
    {
        let mut filter = Self::none();
        for ty in types {
            filter.set(ty, true);
        }
        filter
    }

    pub fn allows(&self, ty: EventType) -> bool {
        self.enabled.get(&ty).copied().unwrap_or(false)
    }

    pub fn set(&mut self, ty: EventType, visible: bool) {
        self.enabled.insert(ty, visible);
    }

    pub fn toggle(&mut self, ty: EventType) {
        let visible = self.allows(ty);
        self.set(ty, !visible);
    }

    pub fn is_all(&self) -> bool {
        EventType::iter().all(|t| self.allows(t))
    }
}

/// Keeps events whose type is visible in `filters`, in their original order.
pub fn apply_type_filter<'a, I>(events: I, filters: &TypeFilter) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter(|e| filters.allows(e.event_type))
        .collect()
}

/// Events split around a reference day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeBuckets<'a> {
    /// `date >= today`, soonest first.
    pub upcoming: Vec<&'a Event>,
    /// `date < today`, most recent first.
    pub past: Vec<&'a Event>,
}

impl<'a> TimeBuckets<'a> {
    pub fn upcoming_preview(&self, limit: usize) -> &[&'a Event] {
        &self.upcoming[..self.upcoming.len().min(limit)]
    }

    pub fn recent_past(&self, limit: usize) -> &[&'a Event] {
        &self.past[..self.past.len().min(limit)]
    }
}

/// Splits `events` by calendar day relative to `today`.
///
/// Events dated today are upcoming. Both sorts are stable, so events sharing
/// a date keep their original relative order.
pub fn partition_by_time<'a, I>(events: I, today: NaiveDate) -> TimeBuckets<'a>
where
    I: IntoIterator<Item = &'a Event>,
{
    let (mut upcoming, mut past): (Vec<&Event>, Vec<&Event>) =
        events.into_iter().partition(|e| e.date >= today);

    upcoming.sort_by(|a, b| a.date.cmp(&b.date));
    past.sort_by(|a, b| b.date.cmp(&a.date));

    TimeBuckets { upcoming, past }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: &str, date: &str, ty: EventType) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: String::new(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: "6:00 PM".to_string(),
            location: String::new(),
            event_type: ty,
        }
    }

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_default_filter_allows_everything() {
        let filter = TypeFilter::default();
        assert!(filter.is_all());
        for ty in EventType::iter() {
            assert!(filter.allows(ty));
        }
    }

    #[test]
    fn test_toggle_and_only() {
        let mut filter = TypeFilter::all();
        filter.toggle(EventType::Social);
        assert!(!filter.allows(EventType::Social));
        assert!(!filter.is_all());
        filter.toggle(EventType::Social);
        assert!(filter.is_all());

        let only = TypeFilter::only([EventType::Workshop]);
        assert!(only.allows(EventType::Workshop));
        assert!(!only.allows(EventType::General));
    }

    #[test]
    fn test_type_filter_keeps_order() {
        let events = vec![
            ev("1", "2025-01-01", EventType::Social),
            ev("2", "2025-01-02", EventType::Academic),
            ev("3", "2025-01-03", EventType::Social),
        ];
        let filtered = apply_type_filter(&events, &TypeFilter::only([EventType::Social]));
        assert_eq!(ids(&filtered), vec!["1", "3"]);
    }

    #[test]
    fn test_partition_orders_each_side() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let events = vec![
            ev("a", "2025-03-20", EventType::General),
            ev("b", "2025-02-01", EventType::General),
            ev("c", "2025-03-11", EventType::General),
            ev("d", "2025-03-09", EventType::General),
        ];
        let buckets = partition_by_time(&events, today);
        assert_eq!(ids(&buckets.upcoming), vec!["c", "a"]);
        assert_eq!(ids(&buckets.past), vec!["d", "b"]);
    }

    #[test]
    fn test_preview_slices_are_bounded() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let events: Vec<Event> = (1..=8)
            .map(|d| ev(&d.to_string(), &format!("2025-02-0{}", d), EventType::General))
            .collect();
        let buckets = partition_by_time(&events, today);
        assert!(buckets.upcoming_preview(UPCOMING_PREVIEW_LEN).is_empty());
        assert_eq!(
            ids(buckets.recent_past(PAST_EVENTS_SHOWN)),
            vec!["8", "7", "6", "5", "4"]
        );
    }
}
