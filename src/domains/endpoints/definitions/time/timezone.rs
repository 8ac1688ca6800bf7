//! IANA timezone listing and conversion endpoint.

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Offset, Utc};
use chrono_tz::{OffsetComponents, TZ_VARIANTS, Tz};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::timestamp::{parse_instant, relative};
use crate::domains::endpoints::{Endpoint, EndpointError, Failure, HandlerOutcome};

const COMMON_ZONES: &[&str] = &[
    "UTC",
    "Africa/Nairobi",
    "America/New_York",
    "America/Los_Angeles",
    "Europe/London",
    "Europe/Paris",
    "Asia/Tokyo",
    "Asia/Dubai",
    "Australia/Sydney",
];

const REGION_SAMPLE: usize = 10;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TimezoneParams {
    /// Source zone, e.g. `Africa/Nairobi`.
    pub from: Option<String>,

    /// Target zone, e.g. `America/New_York`.
    pub to: Option<String>,

    /// Instant to convert (Unix or ISO 8601); defaults to now.
    pub time: Option<String>,

    /// strftime pattern for the local times.
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

pub struct TimezoneTool;

pub fn parse_zone(raw: &str) -> Option<Tz> {
    raw.trim().parse::<Tz>().ok()
}

fn offset_seconds(local: &DateTime<Tz>) -> i32 {
    local.offset().fix().local_minus_utc()
}

fn is_dst(local: &DateTime<Tz>) -> bool {
    local.offset().dst_offset() != chrono::Duration::zero()
}

fn valid_format(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

fn zone_side(zone: Tz, local: &DateTime<Tz>, pattern: &str) -> Value {
    json!({
        "timezone": zone.name(),
        "local_time": local.format(pattern).to_string(),
        "offset": local.format("%:z").to_string(),
        "name": local.format("%Z").to_string(),
    })
}

fn listing(now: DateTime<Utc>) -> Value {
    let common: Vec<Value> = COMMON_ZONES
        .iter()
        .filter_map(|name| parse_zone(name))
        .map(|zone| {
            let local = now.with_timezone(&zone);
            json!({
                "name": zone.name(),
                "offset": local.format("%:z").to_string(),
                "current_time": local.format("%H:%M:%S").to_string(),
            })
        })
        .collect();

    let region = |prefix: &str| -> Vec<&'static str> {
        TZ_VARIANTS
            .iter()
            .map(|zone| zone.name())
            .filter(|name| name.starts_with(prefix))
            .take(REGION_SAMPLE)
            .collect()
    };

    json!({
        "total_zones": TZ_VARIANTS.len(),
        "common_zones": common,
        "zones_by_region": {
            "africa": region("Africa/"),
            "america": region("America/"),
            "europe": region("Europe/"),
            "asia": region("Asia/"),
        },
    })
}

#[async_trait]
impl Endpoint for TimezoneTool {
    const CATEGORY: &'static str = "time";
    const NAME: &'static str = "timezone";
    const DESCRIPTION: &'static str = "List IANA timezones or convert a time between two of them";
    type Params = TimezoneParams;

    async fn execute(&self, params: TimezoneParams) -> Result<HandlerOutcome, EndpointError> {
        let now = Utc::now();
        let (Some(from), Some(to)) = (
            params.from.as_deref().filter(|z| !z.trim().is_empty()),
            params.to.as_deref().filter(|z| !z.trim().is_empty()),
        ) else {
            return Ok(HandlerOutcome::success(listing(now)));
        };

        let (Some(from_zone), Some(to_zone)) = (parse_zone(from), parse_zone(to)) else {
            return Ok(Failure::invalid_input("Invalid timezone(s)")
                .with_suggestion("Use timezone names like \"Africa/Nairobi\" or \"America/New_York\"")
                .into());
        };
        if !valid_format(&params.format) {
            return Ok(Failure::invalid_input(format!("Invalid format: {}", params.format))
                .with_suggestion("Use strftime specifiers such as %Y-%m-%d %H:%M:%S")
                .into());
        }

        let requested = params.time.as_deref().filter(|t| !t.trim().is_empty());
        let instant = match requested {
            Some(raw) => match parse_instant(raw) {
                Some(instant) => instant,
                None => {
                    return Ok(Failure::invalid_input("Invalid time")
                        .with_suggestion("Use Unix timestamp (seconds/milliseconds) or ISO 8601 string")
                        .into());
                }
            },
            None => now,
        };

        let from_local = instant.with_timezone(&from_zone);
        let to_local = instant.with_timezone(&to_zone);
        let minutes = (offset_seconds(&to_local) - offset_seconds(&from_local)) / 60;
        let direction = if minutes >= 0 { "ahead" } else { "behind" };
        let hours = f64::from(minutes) / 60.0;

        Ok(HandlerOutcome::success(json!({
            "conversion": {
                "from": zone_side(from_zone, &from_local, &params.format),
                "to": zone_side(to_zone, &to_local, &params.format),
                "difference": {
                    "hours": hours,
                    "minutes": minutes,
                    "direction": direction,
                    "human": format!("{} hours {}", hours.abs(), direction),
                },
            },
            "input": {
                "time": requested.unwrap_or("current"),
                "format": params.format,
            },
            "alternatives": {
                "iso": instant.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "unix": instant.timestamp(),
                "rfc2822": to_local.format("%a, %d %b %Y %H:%M:%S %z").to_string(),
                "human": relative(instant, now),
            },
            "daylight_saving": {
                "from": is_dst(&from_local),
                "to": is_dst(&to_local),
                "note": "Times may vary during DST transitions",
            },
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(from: &str, to: &str, time: Option<&str>) -> TimezoneParams {
        TimezoneParams {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            time: time.map(str::to_string),
            format: default_format(),
        }
    }

    #[test]
    fn test_parse_zone() {
        assert_eq!(parse_zone("Africa/Nairobi"), Some(Tz::Africa__Nairobi));
        assert_eq!(parse_zone(" UTC "), Some(Tz::UTC));
        assert!(parse_zone("Mars/Olympus_Mons").is_none());
    }

    #[tokio::test]
    async fn test_convert_nairobi_to_new_york_in_summer() {
        let outcome = TimezoneTool
            .execute(params("Africa/Nairobi", "America/New_York", Some("2024-07-01T12:00:00Z")))
            .await
            .unwrap();
        let conversion = &outcome.payload()["conversion"];
        assert_eq!(conversion["from"]["local_time"], "2024-07-01 15:00:00");
        assert_eq!(conversion["to"]["local_time"], "2024-07-01 08:00:00");
        assert_eq!(conversion["to"]["offset"], "-04:00");
        assert_eq!(conversion["difference"]["minutes"], -420);
        assert_eq!(conversion["difference"]["direction"], "behind");
        assert_eq!(outcome.payload()["daylight_saving"]["to"], true);
        assert_eq!(outcome.payload()["daylight_saving"]["from"], false);
    }

    #[tokio::test]
    async fn test_winter_offset_differs() {
        let outcome = TimezoneTool
            .execute(params("UTC", "Europe/London", Some("2024-01-15T12:00:00Z")))
            .await
            .unwrap();
        let conversion = &outcome.payload()["conversion"];
        assert_eq!(conversion["difference"]["minutes"], 0);
        assert_eq!(conversion["to"]["name"], "GMT");
    }

    #[tokio::test]
    async fn test_listing_without_zones() {
        let params = TimezoneParams {
            from: None,
            to: Some("UTC".to_string()),
            time: None,
            format: default_format(),
        };
        let outcome = TimezoneTool.execute(params).await.unwrap();
        let payload = outcome.payload();
        assert!(payload["total_zones"].as_u64().unwrap() > 300);
        assert_eq!(payload["common_zones"].as_array().unwrap().len(), COMMON_ZONES.len());
        assert_eq!(payload["zones_by_region"]["africa"].as_array().unwrap().len(), REGION_SAMPLE);
    }

    #[tokio::test]
    async fn test_invalid_inputs_fail() {
        let bad_zone = params("Nowhere/City", "UTC", None);
        assert!(!TimezoneTool.execute(bad_zone).await.unwrap().is_success());

        let mut bad_format = params("UTC", "Asia/Tokyo", None);
        bad_format.format = "%Q %".to_string();
        assert!(!TimezoneTool.execute(bad_format).await.unwrap().is_success());

        let bad_time = params("UTC", "Asia/Tokyo", Some("300000000000000"));
        assert!(!TimezoneTool.execute(bad_time).await.unwrap().is_success());
    }
}
