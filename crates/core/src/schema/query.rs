//! Query-string parsing for list endpoints.
//!
//! Query values arrive as strings. Numeric parameters must be plain digit
//! strings; anything else is reported against the parameter's name rather
//! than silently replaced by a default. A `limit` above 100 is a range error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use validator::ValidationErrors;

use super::field_error;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 100;

static DIGITS: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\d+$").unwrap()
});

/// Raw pagination parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parsed pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u64,
    pub limit: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Rows to skip for this page. Page 0 is treated as page 1.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Raw session list parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListQueryParams {
    pub active: Option<String>,
    pub limit: Option<String>,
}

/// Parsed session list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionListQuery {
    /// `None` lists sessions regardless of state.
    pub active: Option<bool>,
    pub limit: u64,
}

/// Parse `page` and `limit`, defaulting to page 1 with 10 rows.
pub fn parse_list_query(params: &ListQueryParams) -> Result<ListQuery, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let page = parse_count(&mut errors, "page", params.page.as_deref(), DEFAULT_PAGE);
    let limit = parse_limit(&mut errors, params.limit.as_deref());

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ListQuery { page, limit })
}

/// Parse the `active` tri-state and `limit`.
///
/// Only the exact strings `"true"` and `"false"` filter; any other value
/// means no filter.
pub fn parse_session_list_query(
    params: &SessionListQueryParams,
) -> Result<SessionListQuery, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let active = match params.active.as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    };
    let limit = parse_limit(&mut errors, params.limit.as_deref());

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(SessionListQuery { active, limit })
}

fn parse_limit(errors: &mut ValidationErrors, raw: Option<&str>) -> u64 {
    let limit = parse_count(errors, "limit", raw, DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        errors.add("limit", field_error("range", "must be at most 100"));
        return DEFAULT_LIMIT;
    }
    limit
}

fn parse_count(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    default: u64,
) -> u64 {
    let Some(raw) = raw else {
        return default;
    };

    if !DIGITS.is_match(raw) {
        errors.add(field, field_error("integer", "must be a non-negative integer"));
        return default;
    }

    raw.parse().unwrap_or_else(|_| {
        errors.add(field, field_error("range", "is too large"));
        default
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn list(page: Option<&str>, limit: Option<&str>) -> Result<ListQuery, ValidationErrors> {
        parse_list_query(&ListQueryParams {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        })
    }

    fn sessions(active: Option<&str>, limit: Option<&str>) -> Result<SessionListQuery, ValidationErrors> {
        parse_session_list_query(&SessionListQueryParams {
            active: active.map(str::to_string),
            limit: limit.map(str::to_string),
        })
    }

    #[test]
    fn test_list_defaults() {
        assert_eq!(list(None, None).unwrap(), ListQuery { page: 1, limit: 10 });
    }

    #[test]
    fn test_list_coerces_digit_strings() {
        let query = list(Some("3"), Some("25")).unwrap();
        assert_eq!(query, ListQuery { page: 3, limit: 25 });
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn test_list_rejects_non_digits_by_field() {
        for bad in ["-1", "1.5", "ten", "", " 2"] {
            let err = list(Some(bad), None).unwrap_err();
            assert!(err.field_errors().contains_key("page"), "page {bad:?}");
            assert!(!err.field_errors().contains_key("limit"));
        }

        let err = list(None, Some("abc")).unwrap_err();
        assert!(err.field_errors().contains_key("limit"));
    }

    #[test]
    fn test_list_rejects_overflow() {
        let err = list(Some("99999999999999999999999"), None).unwrap_err();
        assert!(err.field_errors().contains_key("page"));
    }

    #[test]
    fn test_list_rejects_limit_over_max() {
        assert_eq!(list(None, Some("100")).unwrap().limit, 100);

        let err = list(None, Some("101")).unwrap_err();
        let fields = err.field_errors();
        assert_eq!(fields["limit"][0].code, "range");
        assert!(!fields.contains_key("page"));
    }

    #[test]
    fn test_page_zero_has_no_offset() {
        assert_eq!(list(Some("0"), None).unwrap().offset(), 0);
    }

    #[test]
    fn test_session_query_filters() {
        assert_eq!(
            sessions(Some("true"), Some("5")).unwrap(),
            SessionListQuery { active: Some(true), limit: 5 }
        );
        assert_eq!(
            sessions(Some("false"), None).unwrap(),
            SessionListQuery { active: Some(false), limit: 10 }
        );
    }

    #[test]
    fn test_session_query_unknown_active_means_no_filter() {
        for value in [Some("maybe"), Some("TRUE"), Some("1"), None] {
            assert_eq!(
                sessions(value, None).unwrap(),
                SessionListQuery { active: None, limit: 10 }
            );
        }
    }

    #[test]
    fn test_session_query_rejects_bad_limit() {
        for bad in ["five", "5000"] {
            let err = sessions(Some("true"), Some(bad)).unwrap_err();
            assert!(err.field_errors().contains_key("limit"), "limit {bad:?}");
        }
    }
}
