//! Parsing of the portal's ASP.NET WebForms responses.
//!
//! The first page load is plain HTML; every later postback is sent with
//! `__ASYNCPOST=true` and answered with a "delta" response made of
//! `|<length>|<type>|<id>|<content>|` segments.

use super::error::FetchError;
use crate::catalog::Region;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

pub const VIEWSTATE: &str = "__VIEWSTATE";
pub const VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
pub const EVENT_VALIDATION: &str = "__EVENTVALIDATION";

static HIDDEN_FIELD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|(\d+)\|hiddenField\|([^|]+)\|").unwrap());
static SELECT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("select").unwrap());
static OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("option").unwrap());

/// The hidden fields that have to be echoed back with every postback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub viewstate: String,
    pub viewstate_generator: String,
    pub event_validation: String,
}

impl FormState {
    /// Reads the form state from the `<input type="hidden">` fields of a full page.
    pub fn from_html(html: &str) -> Result<Self, FetchError> {
        let document = Html::parse_document(html);

        let field = |name: &str| -> Result<String, FetchError> {
            let selector = Selector::parse(&format!("input[name=\"{name}\"]")).map_err(|e| {
                FetchError::Parse {
                    message: format!("Bad selector for {name}: {e:?}"),
                }
            })?;
            document
                .select(&selector)
                .next()
                .and_then(|el| el.value().attr("value"))
                .map(str::to_string)
                .ok_or_else(|| FetchError::MissingFormState {
                    field: name.to_string(),
                })
        };

        Ok(Self {
            viewstate: field(VIEWSTATE)?,
            viewstate_generator: field(VIEWSTATE_GENERATOR)?,
            event_validation: field(EVENT_VALIDATION)?,
        })
    }

    /// Reads the form state from a delta response.
    ///
    /// Only `__VIEWSTATE` is mandatory; the portal sometimes omits the other
    /// two, in which case they are sent back empty.
    pub fn from_delta(text: &str) -> Result<Self, FetchError> {
        let viewstate = delta_hidden_field(text, VIEWSTATE)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FetchError::MissingFormState {
                field: VIEWSTATE.to_string(),
            })?;

        Ok(Self {
            viewstate,
            viewstate_generator: delta_hidden_field(text, VIEWSTATE_GENERATOR).unwrap_or_default(),
            event_validation: delta_hidden_field(text, EVENT_VALIDATION).unwrap_or_default(),
        })
    }
}

/// Extracts a hidden field value from a delta response.
///
/// The declared length counts characters, not bytes.
fn delta_hidden_field(text: &str, name: &str) -> Option<String> {
    HIDDEN_FIELD_REGEX
        .captures_iter(text)
        .find(|caps| caps.get(2).is_some_and(|m| m.as_str() == name))
        .and_then(|caps| {
            let length = caps.get(1)?.as_str().parse::<usize>().ok()?;
            let start = caps.get(0)?.end();
            Some(text[start..].chars().take(length).collect())
        })
}

/// Returns the options of the `<select>` with the given element id, in
/// document order. Empty values, the `"0"` placeholder and blank labels are
/// skipped.
pub fn dropdown_options(text: &str, select_id: &str) -> Vec<Region> {
    let document = Html::parse_document(text);

    let Some(select) = document
        .select(&SELECT_SELECTOR)
        .find(|el| el.value().id() == Some(select_id))
    else {
        return Vec::new();
    };

    select
        .select(&OPTION_SELECTOR)
        .filter_map(|option| {
            let value = option.value().attr("value").unwrap_or("").trim();
            let label = option.text().collect::<String>().trim().to_string();
            if value.is_empty() || value == "0" || label.is_empty() {
                None
            } else {
                Some(Region::new(value, label))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: &str = "1|#||4|52|updatePanel|ctl00_ContentPlaceHolder1_UpdatePanel1|\
        <select id=\"x\"></select>|\
        8|hiddenField|__VIEWSTATE|/wEPDw==|\
        8|hiddenField|__VIEWSTATEGENERATOR|CA0B0334|\
        12|hiddenField|__EVENTVALIDATION|/wEdAAk=ab|c|\
        0|asyncPostBackControlIDs|||";

    #[test]
    fn test_delta_hidden_fields_honour_length() {
        let state = FormState::from_delta(DELTA).unwrap();
        assert_eq!(state.viewstate, "/wEPDw==");
        assert_eq!(state.viewstate_generator, "CA0B0334");
        // the value itself contains a pipe; the declared length wins
        assert_eq!(state.event_validation, "/wEdAAk=ab|c");
    }

    #[test]
    fn test_delta_without_viewstate_is_an_error() {
        let err = FormState::from_delta("0|asyncPostBackControlIDs|||").unwrap_err();
        assert!(matches!(err, FetchError::MissingFormState { ref field } if field == VIEWSTATE));
    }

    #[test]
    fn test_form_state_from_html() {
        let html = r#"<html><body><form>
            <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="vs" />
            <input type="hidden" name="__VIEWSTATEGENERATOR" value="gen" />
            <input type="hidden" name="__EVENTVALIDATION" value="ev" />
        </form></body></html>"#;

        let state = FormState::from_html(html).unwrap();
        assert_eq!(
            state,
            FormState {
                viewstate: "vs".into(),
                viewstate_generator: "gen".into(),
                event_validation: "ev".into(),
            }
        );
    }

    #[test]
    fn test_form_state_from_html_missing_field() {
        let html = r#"<input type="hidden" name="__VIEWSTATE" value="vs" />"#;
        assert!(matches!(
            FormState::from_html(html),
            Err(FetchError::MissingFormState { .. })
        ));
    }

    #[test]
    fn test_dropdown_skips_placeholders_and_keeps_order() {
        let text = r#"|420|updatePanel|panel|
            <select name="ctl00$ContentPlaceHolder1$ddlDist" id="ctl00_ContentPlaceHolder1_ddlDist">
                <option value="0">--Select--</option>
                <option value="612">Hyderabad</option>
                <option value="">Empty</option>
                <option value="605"> Adilabad </option>
                <option value="699"></option>
            </select>
            <select id="other"><option value="1">Elsewhere</option></select>|"#;

        let districts = dropdown_options(text, "ctl00_ContentPlaceHolder1_ddlDist");
        assert_eq!(
            districts,
            vec![Region::new("612", "Hyderabad"), Region::new("605", "Adilabad")]
        );
        assert!(dropdown_options(text, "missing").is_empty());
    }
}
