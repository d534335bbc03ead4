use std::fmt::Write;

use chrono::Local;
use forecast_core::{LookupResult, View};

/// Text for the results region of the form.
pub fn render(view: View<'_>) -> String {
    let mut out = String::new();

    match view {
        View::Loading => out.push_str("Fetching results...\n"),
        // The previous result stays in the form state but is not shown.
        View::Failed { message, .. } => {
            let _ = writeln!(out, "error: {message}");
            out.push_str("No results\n");
        }
        View::Results { query, result } => {
            if let Some(query) = query {
                let _ = writeln!(out, "Results for '{query}' fetched successfully.");
            }
            write_result(&mut out, result);
        }
        View::Empty => out.push_str("No results\n"),
    }

    out
}

fn write_result(out: &mut String, r: &LookupResult) {
    let daytime = if r.is_day { "day" } else { "night" };

    let _ = writeln!(out, "  {}", r.place());
    let _ = writeln!(
        out,
        "  {} °C | {} °F  {} ({daytime})",
        r.temperature_c, r.temperature_f, r.condition_text
    );
    let _ = writeln!(out, "  Humidity: {}%", r.humidity_pct);
    let _ = writeln!(out, "  Wind: {} km/h ({} mph)", r.wind_kph, r.wind_mph);
    if !r.condition_icon_url.is_empty() {
        let _ = writeln!(out, "  Icon: {}", r.condition_icon_url);
    }
    if let Some(at) = r.observed_at {
        let _ = writeln!(out, "  Updated: {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn madrid() -> LookupResult {
        LookupResult {
            location_name: "Madrid".into(),
            region_name: "Madrid".into(),
            temperature_c: 22.0,
            temperature_f: 71.6,
            humidity_pct: 40,
            wind_kph: 9.0,
            wind_mph: 5.6,
            is_day: false,
            condition_text: "Clear".into(),
            condition_icon_url: "https://cdn/113.png".into(),
            observed_at: None,
        }
    }

    #[test]
    fn renders_result_with_banner() {
        let result = madrid();
        let text = render(View::Results { query: Some("Madrid"), result: &result });

        assert!(text.starts_with("Results for 'Madrid' fetched successfully."));
        assert!(text.contains("Madrid, Madrid"));
        assert!(text.contains("22 °C | 71.6 °F  Clear (night)"));
        assert!(text.contains("Humidity: 40%"));
        assert!(text.contains("Wind: 9 km/h (5.6 mph)"));
    }

    #[test]
    fn error_hides_previous_result() {
        let result = madrid();
        let text = render(View::Failed { message: "Not found", stale: Some(&result) });

        assert_eq!(text, "error: Not found\nNo results\n");
        assert!(!text.contains("Madrid, Madrid"));
    }

    #[test]
    fn renders_placeholders() {
        assert_eq!(render(View::Loading), "Fetching results...\n");
        assert_eq!(render(View::Empty), "No results\n");
    }
}
