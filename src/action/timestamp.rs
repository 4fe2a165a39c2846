//! Wall-clock timestamps reported by the action

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

const FORMAT: &str = "%H:%M:%S GMT%z";

/// Current local time, e.g. `14:03:27 GMT+0200`
pub fn timestamp() -> String {
    format_time(&Local::now())
}

pub fn format_time<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format(FORMAT).to_string()
}
