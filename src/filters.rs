//! Date / form-type filtering and page windows over a sorted filing list

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::FilingRecord;

/// Coarse family tokens accepted in form filters
const FORM_ALIASES: &[(&str, &[&str])] = &[
    ("OWNERSHIP", &["3", "4", "5"]),
    ("INSIDER", &["3", "4", "5"]),
    ("REGISTRATION", &["S-1", "424B"]),
    ("OFFERING", &["S-1", "S-3", "F-1", "424B"]),
    ("CURRENT", &["8-K"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Empty means every form type
    #[serde(default)]
    pub form_types: Vec<String>,
}

impl FilingFilter {
    pub fn matches(&self, filing: &FilingRecord) -> bool {
        if self.date_from.is_some_and(|from| filing.filed_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| filing.filed_date > to) {
            return false;
        }
        self.form_types.is_empty()
            || self
                .form_types
                .iter()
                .any(|token| form_token_matches(&filing.form_type, token))
    }
}

/// Case-insensitive prefix match of `token` (or each code of an alias) against `form`.
///
/// A token ending in a digit must not be followed by another digit, so `4`
/// covers `4` and `4/A` but not `424B2`, and `S-1` does not cover `S-11`.
pub fn form_token_matches(form: &str, token: &str) -> bool {
    let token = token.trim().to_ascii_uppercase();
    if token.is_empty() {
        return false;
    }
    let form = form.trim().to_ascii_uppercase();

    match FORM_ALIASES.iter().find(|(alias, _)| *alias == token) {
        Some((_, codes)) => codes.iter().any(|code| prefix_matches(&form, code)),
        None => prefix_matches(&form, &token),
    }
}

fn prefix_matches(form: &str, token: &str) -> bool {
    let Some(rest) = form.strip_prefix(token) else {
        return false;
    };
    let token_ends_in_digit = token.chars().last().is_some_and(|c| c.is_ascii_digit());
    let rest_starts_with_digit = rest.chars().next().is_some_and(|c| c.is_ascii_digit());
    !(token_ends_in_digit && rest_starts_with_digit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Page at least 1, size within `1..=max_page_size`
    pub fn clamped(self, max_page_size: usize) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max_page_size.max(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window<T> {
    pub items: Vec<T>,
    /// Count before slicing
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}

pub fn filter(filings: Vec<FilingRecord>, filter: &FilingFilter) -> Vec<FilingRecord> {
    filings.into_iter().filter(|f| filter.matches(f)).collect()
}

/// Slice one page out of `items`
pub fn paginate<T>(items: Vec<T>, request: PageRequest, max_page_size: usize) -> Window<T> {
    let request = request.clamped(max_page_size);
    let total = items.len();
    let offset = (request.page - 1).saturating_mul(request.page_size);

    let window: Vec<T> = items.into_iter().skip(offset).take(request.page_size).collect();

    Window {
        items: window,
        total,
        page: request.page,
        page_size: request.page_size,
        has_more: offset.saturating_add(request.page_size) < total,
    }
}

/// Filter then paginate
pub fn apply(
    filings: Vec<FilingRecord>,
    filing_filter: &FilingFilter,
    request: PageRequest,
    max_page_size: usize,
) -> Window<FilingRecord> {
    paginate(filter(filings, filing_filter), request, max_page_size)
}
