use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text currently typed into the form. Also the JSON body sent to the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupQuery {
    pub query: String,
}

impl LookupQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// Flattened current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub location_name: String,
    pub region_name: String,
    pub temperature_c: f64,
    pub temperature_f: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub wind_mph: f64,
    pub is_day: bool,
    pub condition_text: String,
    pub condition_icon_url: String,
    /// When the backend last refreshed the reading, if it says so.
    pub observed_at: Option<DateTime<Utc>>,
}

impl LookupResult {
    /// "Madrid, Madrid" style label used in headings.
    pub fn place(&self) -> String {
        if self.region_name.is_empty() {
            self.location_name.clone()
        } else {
            format!("{}, {}", self.location_name, self.region_name)
        }
    }
}
