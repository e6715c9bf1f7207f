use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use std::collections::HashSet;

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Collects the distinct ids produced by `ids`, keeping first-seen order.
pub fn unique_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for id in ids {
        if seen.insert(id) {
            out.push(id.to_string());
        }
    }
    out
}

pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|_| {
        ReportError::DateError(format!(
            "Invalid date format: {}. Expected YYYY-MM-DD",
            value
        ))
    })
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Treats blank strings the same as a missing value.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
