use crate::{LookupResult, state::FormState};

/// What the results region of the form shows for a given state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View<'a> {
    Loading,
    /// The last lookup failed. `stale` is whatever succeeded before it.
    Failed { message: &'a str, stale: Option<&'a LookupResult> },
    /// `query` is set when the field is non-empty, for the success banner.
    Results { query: Option<&'a str>, result: &'a LookupResult },
    Empty,
}

impl<'a> View<'a> {
    pub fn of(state: &'a FormState) -> Self {
        if state.is_loading() {
            return View::Loading;
        }

        match (state.error(), state.result()) {
            (Some(message), stale) => View::Failed { message, stale },
            (None, Some(result)) => {
                let query = Some(state.query().query.as_str()).filter(|q| !q.is_empty());
                View::Results { query, result }
            }
            (None, None) => View::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        LookupError, LookupQuery,
        state::{Effect, Event, FormState, reduce},
    };
    use reqwest::StatusCode;

    fn madrid() -> LookupResult {
        LookupResult {
            location_name: "Madrid".into(),
            region_name: "Madrid".into(),
            temperature_c: 22.0,
            temperature_f: 71.6,
            humidity_pct: 40,
            wind_kph: 9.0,
            wind_mph: 5.6,
            is_day: true,
            condition_text: "Sunny".into(),
            condition_icon_url: String::new(),
            observed_at: None,
        }
    }

    fn settle(state: &mut FormState, outcome: Result<LookupResult, LookupError>) {
        let Effect::Lookup { request, .. } = reduce(state, Event::Submitted) else {
            panic!("submit must issue a lookup");
        };
        assert_eq!(View::of(state), View::Loading);
        reduce(state, Event::LookupSettled { request, outcome });
    }

    #[test]
    fn fresh_form_is_empty() {
        assert_eq!(View::of(&FormState::default()), View::Empty);
    }

    #[test]
    fn result_carries_banner_query() {
        let mut state = FormState::default().with_query(LookupQuery::new("Madrid"));
        settle(&mut state, Ok(madrid()));

        let View::Results { query, result } = View::of(&state) else {
            panic!("expected results");
        };
        assert_eq!(query, Some("Madrid"));
        assert_eq!(result.location_name, "Madrid");
    }

    #[test]
    fn empty_query_has_no_banner() {
        let mut state = FormState::default();
        settle(&mut state, Ok(madrid()));
        assert!(matches!(View::of(&state), View::Results { query: None, .. }));
    }

    #[test]
    fn failure_carries_message_and_stale_result() {
        let mut state = FormState::default();
        settle(&mut state, Ok(madrid()));
        let not_found = LookupError::rejected(StatusCode::NOT_FOUND, Some("Not found".into()));
        settle(&mut state, Err(not_found));

        let View::Failed { message, stale } = View::of(&state) else {
            panic!("expected failure");
        };
        assert_eq!(message, "Not found");
        assert_eq!(stale.map(|r| r.location_name.as_str()), Some("Madrid"));
    }
}
