// Date/time conversions shared by the calendar views and calendar links.
use crate::model::Event;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// Events carry no end time; links assume this length.
pub const DEFAULT_EVENT_DURATION_HOURS: i64 = 2;

pub const CALENDAR_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

const COMPACT_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("malformed time '{input}': {reason}")]
    Malformed { input: String, reason: &'static str },
    #[error("{0} does not exist in the local time zone")]
    NonexistentLocalTime(NaiveDateTime),
}

/// Parses a 12-hour clock string such as `"3:00 PM"` or `"9 AM"`.
///
/// The meridiem is case-insensitive and minutes default to `00`. Anything
/// else that does not fit `H[:MM] AM|PM` is rejected.
pub fn parse_12h(time12h: &str) -> Result<NaiveTime, TimeError> {
    let malformed = |reason: &'static str| TimeError::Malformed {
        input: time12h.to_string(),
        reason,
    };

    let (clock, meridiem) = time12h
        .trim()
        .split_once(' ')
        .ok_or_else(|| malformed("expected 'H:MM AM' or 'H:MM PM'"))?;

    let pm = match meridiem.trim().to_ascii_uppercase().as_str() {
        "AM" => false,
        "PM" => true,
        _ => return Err(malformed("meridiem must be AM or PM")),
    };

    let (hours, minutes) = match clock.split_once(':') {
        Some((h, m)) => (h, m),
        None => (clock, ""),
    };

    let hours: u32 = hours
        .parse()
        .map_err(|_| malformed("hour is not a number"))?;
    if !(1..=12).contains(&hours) {
        return Err(malformed("hour must be between 1 and 12"));
    }

    let minutes: u32 = if minutes.is_empty() {
        0
    } else {
        minutes
            .parse()
            .map_err(|_| malformed("minutes are not a number"))?
    };
    if minutes > 59 {
        return Err(malformed("minutes must be between 0 and 59"));
    }

    let hour24 = match (hours, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };

    NaiveTime::from_hms_opt(hour24, minutes, 0).ok_or_else(|| malformed("time out of range"))
}

/// `"3:00 PM"` -> `"15:00:00"`.
pub fn to_24_hour(time12h: &str) -> Result<String, TimeError> {
    Ok(parse_12h(time12h)?.format("%H:%M:%S").to_string())
}

/// Wall-clock start of `event` in `tz`. Ambiguous times resolve to the earliest instant.
pub fn start_in<Tz: TimeZone>(event: &Event, tz: &Tz) -> Result<DateTime<Tz>, TimeError> {
    let naive = event.date.and_time(parse_12h(&event.time)?);
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or(TimeError::NonexistentLocalTime(naive))
}

/// Start and end instants of `event` in UTC, end being a fixed two hours later.
pub fn span_in<Tz: TimeZone>(
    event: &Event,
    tz: &Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TimeError> {
    let start = start_in(event, tz)?.with_timezone(&Utc);
    let end = start + Duration::hours(DEFAULT_EVENT_DURATION_HOURS);
    Ok((start, end))
}

/// ISO 8601 basic format in UTC, whole seconds: `20250301T230000Z`.
pub fn format_compact_utc(instant: &DateTime<Utc>) -> String {
    instant.format(COMPACT_UTC_FORMAT).to_string()
}

/// Parses a `start/end` pair in compact UTC format back into instants.
pub fn parse_compact_range(dates: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = dates.split_once('/')?;
    let parse = |s: &str| {
        NaiveDateTime::parse_from_str(s, COMPACT_UTC_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    };
    Some((parse(start)?, parse(end)?))
}

/// Add-to-calendar deep link for `event`, interpreting its date and time in `tz`.
pub fn calendar_link_in<Tz: TimeZone>(event: &Event, tz: &Tz) -> Result<String, TimeError> {
    let (start, end) = span_in(event, tz)?;
    let dates = format!("{}/{}", format_compact_utc(&start), format_compact_utc(&end));

    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("action", "TEMPLATE")
        .append_pair("text", &event.title)
        .append_pair("dates", &dates)
        .append_pair("details", &event.description)
        .append_pair("location", &event.location)
        .finish();

    Ok(format!("{}?{}", CALENDAR_TEMPLATE_URL, query))
}

/// Add-to-calendar deep link using the viewer's local time zone.
pub fn calendar_link(event: &Event) -> Result<String, TimeError> {
    calendar_link_in(event, &Local)
}

/// `YYYY-MM-DD` of the calendar day `instant` falls on in its own time zone.
pub fn local_date_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    date_key(instant.date_naive())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Today's date on the viewer's local calendar.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
