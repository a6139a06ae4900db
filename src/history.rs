use crate::user_models::{HistoryEntry, UserRecord};
use chrono::{DateTime, Local, TimeZone};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Appends a detection to the user's history, stamped with the local time to
/// the minute.
pub fn record(record: &mut UserRecord, emotion: &str, platform: &str, link: Option<&str>) {
    record_at(record, emotion, platform, link, Local::now());
}

pub fn record_at<Tz: TimeZone>(
    record: &mut UserRecord,
    emotion: &str,
    platform: &str,
    link: Option<&str>,
    at: DateTime<Tz>,
) where
    Tz::Offset: std::fmt::Display,
{
    record.history.push(HistoryEntry {
        emotion: emotion.to_string(),
        platform: platform.to_string(),
        timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
        link: link.unwrap_or_default().to_string(),
    });
}
