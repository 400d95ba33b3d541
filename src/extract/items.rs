//! Item codes in current reports (8-K family)

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::models::Signals;

static ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bitem\s+(\d{1,2})\.(\d{2})\b").expect("item pattern compiles")
});

/// Well-known items worth surfacing as badges
const HIGHLIGHTS: &[(&str, &str)] = &[
    ("1.01", "Material Agreement"),
    ("1.02", "Agreement Terminated"),
    ("1.03", "Bankruptcy"),
    ("2.01", "Acquisition/Disposition"),
    ("2.02", "Earnings Results"),
    ("2.03", "New Debt Obligation"),
    ("4.02", "Restatement"),
    ("5.02", "Executive Change"),
    ("5.07", "Shareholder Vote"),
    ("8.01", "Other Events"),
];

pub fn highlight_for(code: &str) -> Option<&'static str> {
    HIGHLIGHTS
        .iter()
        .find(|(item, _)| *item == code)
        .map(|(_, label)| *label)
}

pub fn extract_items(text: &str) -> Option<Signals> {
    let codes: BTreeSet<(u8, u8)> = ITEM_PATTERN
        .captures_iter(text)
        .filter_map(|caps| Some((caps[1].parse().ok()?, caps[2].parse().ok()?)))
        .collect();

    if codes.is_empty() {
        return None;
    }

    let item_codes: Vec<String> = codes
        .into_iter()
        .map(|(major, minor)| format!("{}.{:02}", major, minor))
        .collect();
    let highlight_labels = item_codes
        .iter()
        .filter_map(|code| highlight_for(code))
        .map(str::to_string)
        .collect();

    Some(Signals {
        item_codes,
        highlight_labels,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_distinct_ordered_items() {
        let text = "Item 5.02 Departure of Directors. ITEM 2.02 Results of Operations. \
                    See Item 2.02 above. Item 9.01 Financial Statements and Exhibits.";
        let signals = extract_items(text).unwrap();
        assert_eq!(signals.item_codes, vec!["2.02", "5.02", "9.01"]);
        assert_eq!(signals.highlight_labels, vec!["Earnings Results", "Executive Change"]);
    }

    #[test]
    fn test_numeric_ordering_and_leading_zero() {
        let signals = extract_items("Item 10.01 and item 02.03 and Item 1.01").unwrap();
        assert_eq!(signals.item_codes, vec!["1.01", "2.03", "10.01"]);
    }

    #[test]
    fn test_ignores_non_item_decimals() {
        assert!(extract_items("Revenue grew 2.02% while items 3 and 4 shipped").is_none());
        assert!(extract_items("Item 2.021 is not a code").is_none());
    }
}
