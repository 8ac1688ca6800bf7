//! Timestamp conversion endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

/// Integers below this are seconds, at or above it milliseconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimestampParams {
    /// Unix seconds, Unix milliseconds or an ISO 8601 / RFC 3339 string.
    /// Defaults to the current time.
    pub timestamp: Option<String>,

    /// `UTC` (default) or a fixed offset such as `+03:00`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

pub struct TimestampTool;

/// RFC 2822 layout; unlike `to_rfc2822` it cannot panic on shifted years.
const RFC2822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Years every output format can represent.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse an instant from Unix seconds/milliseconds or an ISO string.
///
/// Instants outside years 0 to 9999 are rejected.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    parse_any(raw.trim()).filter(|instant| SUPPORTED_YEARS.contains(&instant.year()))
}

fn parse_any(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(number) = raw.parse::<i64>() {
        return if number.abs() < MILLIS_THRESHOLD {
            DateTime::from_timestamp(number, 0)
        } else {
            DateTime::from_timestamp_millis(number)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `UTC`/`Z` or `±HH:MM` / `±HHMM`.
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("utc") || raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("gmt") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// "3 hours ago" / "in 2 days" relative to `now`.
pub fn relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(instant);
    let seconds = delta.num_seconds().abs();
    let (amount, unit) = match seconds {
        s if s < 45 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 2_592_000 => (s / 86_400, "day"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };
    let amount = amount.max(1);
    let plural = if amount == 1 { "" } else { "s" };
    if delta.num_seconds() >= 0 {
        format!("{} {}{} ago", amount, unit, plural)
    } else {
        format!("in {} {}{}", amount, unit, plural)
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[async_trait]
impl Endpoint for TimestampTool {
    const CATEGORY: &'static str = "time";
    const NAME: &'static str = "timestamp";
    const DESCRIPTION: &'static str = "Convert timestamps between Unix, ISO 8601 and human readable formats";
    type Params = TimestampParams;

    async fn execute(&self, params: TimestampParams) -> Result<HandlerOutcome, EndpointError> {
        let now = Utc::now();
        let requested = params.timestamp.as_deref().filter(|t| !t.trim().is_empty());

        let instant = match requested {
            Some(raw) => match parse_instant(raw) {
                Some(instant) => instant,
                None => {
                    return Ok(Failure::invalid_input("Invalid timestamp")
                        .with_suggestion("Use Unix timestamp (seconds/milliseconds) or ISO 8601 string")
                        .into());
                }
            },
            None => now,
        };

        let Some(offset) = parse_offset(&params.timezone) else {
            return Ok(Failure::invalid_input(format!("Unsupported timezone: {}", params.timezone))
                .with_suggestion("Use UTC or a fixed offset such as +03:00")
                .into());
        };
        let local = instant.with_timezone(&offset);

        Ok(HandlerOutcome::success(json!({
            "timestamp": requested.unwrap_or("current"),
            "timezone": params.timezone,
            "formats": {
                "unix": local.timestamp(),
                "unix_ms": local.timestamp_millis(),
                "iso": instant.to_rfc3339_opts(SecondsFormat::Millis, true),
                "local_iso": local.to_rfc3339_opts(SecondsFormat::Millis, false),
                "rfc2822": local.format(RFC2822_FORMAT).to_string(),
                "human": local.format("%Y-%m-%d %H:%M:%S").to_string(),
                "custom": local.format("%B %-d %Y, %-I:%M:%S %P").to_string(),
            },
            "relative": {
                "from_now": relative(instant, now),
            },
            "components": {
                "year": local.year(),
                "month": local.month(),
                "day": local.day(),
                "hour": local.hour(),
                "minute": local.minute(),
                "second": local.second(),
                "millisecond": local.timestamp_subsec_millis(),
                "day_of_week": local.weekday().num_days_from_sunday(),
                "week_of_year": local.iso_week().week(),
            },
            "validation": {
                "is_valid": true,
                "is_leap_year": is_leap_year(local.year()),
                "quarter": (local.month() - 1) / 3 + 1,
            },
            "timezones": {
                "current": params.timezone,
                "utc_offset": local.format("%:z").to_string(),
            },
        })))
    }
}
