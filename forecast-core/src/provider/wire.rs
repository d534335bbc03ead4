//! JSON shapes shared by the relay and WeatherAPI.com. The relay forwards the
//! WeatherAPI `current`/`location` objects unchanged, wrapped in `data`.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::LookupResult;

#[derive(Debug, Deserialize)]
pub(crate) struct WaLocation {
    pub name: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCondition {
    pub text: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WaCurrent {
    pub temp_c: f64,
    pub temp_f: f64,
    pub humidity: u8,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub is_day: u8,
    pub condition: WaCondition,
    pub last_updated_epoch: Option<i64>,
}

/// `{ current, location }`, the payload of a successful lookup.
#[derive(Debug, Deserialize)]
pub(crate) struct WaCurrentResponse {
    pub location: WaLocation,
    pub current: WaCurrent,
}

impl From<WaCurrentResponse> for LookupResult {
    fn from(res: WaCurrentResponse) -> Self {
        let WaCurrentResponse { location, current } = res;
        LookupResult {
            location_name: location.name,
            region_name: location.region,
            temperature_c: current.temp_c,
            temperature_f: current.temp_f,
            humidity_pct: current.humidity,
            wind_kph: current.wind_kph,
            wind_mph: current.wind_mph,
            is_day: current.is_day == 1,
            condition_text: current.condition.text,
            condition_icon_url: absolute_icon_url(&current.condition.icon),
            observed_at: current.last_updated_epoch.and_then(unix_to_utc),
        }
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

/// WeatherAPI hands out protocol-relative icon URLs (`//cdn.weatherapi.com/...`).
pub(crate) fn absolute_icon_url(icon: &str) -> String {
    match icon.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => icon.to_string(),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "location": { "name": "Madrid", "region": "Madrid", "country": "Spain" },
            "current": {
                "last_updated_epoch": 1_700_000_000,
                "temp_c": 22.0,
                "temp_f": 71.6,
                "is_day": 1,
                "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/weather/64x64/day/113.png" },
                "wind_mph": 5.6,
                "wind_kph": 9.0,
                "humidity": 40
            }
        })
    }

    #[test]
    fn flattens_current_and_location() {
        let parsed: WaCurrentResponse = serde_json::from_value(sample()).unwrap();
        let result = LookupResult::from(parsed);

        assert_eq!(result.location_name, "Madrid");
        assert_eq!(result.region_name, "Madrid");
        assert_eq!(result.temperature_c, 22.0);
        assert_eq!(result.humidity_pct, 40);
        assert!(result.is_day);
        assert_eq!(
            result.condition_icon_url,
            "https://cdn.weatherapi.com/weather/64x64/day/113.png"
        );
        assert_eq!(result.observed_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn night_flag_maps_to_false() {
        let mut value = sample();
        value["current"]["is_day"] = serde_json::json!(0);
        let parsed: WaCurrentResponse = serde_json::from_value(value).unwrap();
        assert!(!LookupResult::from(parsed).is_day);
    }

    #[test]
    fn absolute_icon_urls_are_left_alone() {
        assert_eq!(absolute_icon_url("https://x/y.png"), "https://x/y.png");
        assert_eq!(absolute_icon_url(""), "");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let out = truncate_body(&body);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 203);
    }
}
