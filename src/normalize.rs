//! Null/blank handling.
//!
//! Numeric fields default to `0`. Text fields present in the table default to
//! `"Unknown"`. Columns the table does not carry stay absent.

use crate::ingestion::JoinedLine;
use crate::schema::{Attributes, TextColumn, UNKNOWN};

/// Text columns whose missing values become `"Unknown"`.
pub const TEXT_FIELDS: [TextColumn; 5] = [
    TextColumn::Category,
    TextColumn::Vendor,
    TextColumn::MaterialDesc,
    TextColumn::ColorDesc,
    TextColumn::Territory,
];

/// A joined line after the default-value table has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub group_key: String,
    pub sales_units: f64,
    pub sales_dollars: f64,
    pub returns: f64,
    pub cost: f64,
    pub retail: f64,
    pub attributes: Attributes,
}

pub fn normalize_lines(lines: Vec<JoinedLine>, columns: &[TextColumn]) -> Vec<NormalizedLine> {
    lines
        .into_iter()
        .map(|line| normalize_line(line, columns))
        .collect()
}

pub fn normalize_line(line: JoinedLine, columns: &[TextColumn]) -> NormalizedLine {
    let mut attributes = line.attributes;
    for column in columns {
        let slot = attributes.slot_mut(*column);
        if slot.is_none() && column.defaults_to_unknown() {
            *slot = Some(UNKNOWN.to_string());
        }
    }

    NormalizedLine {
        group_key: line.group_key.unwrap_or_else(|| UNKNOWN.to_string()),
        sales_units: line.sales_units.unwrap_or(0.0),
        sales_dollars: line.sales_dollars.unwrap_or(0.0),
        returns: line.returns.unwrap_or(0.0),
        cost: line.cost.unwrap_or(0.0),
        retail: line.retail.unwrap_or(0.0),
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_get_defaults() {
        let line = JoinedLine {
            sales_units: Some(4.0),
            ..Default::default()
        };
        let out = normalize_line(line, &[TextColumn::Category, TextColumn::Vendor]);

        assert_eq!(out.group_key, UNKNOWN);
        assert_eq!(out.sales_units, 4.0);
        assert_eq!(out.sales_dollars, 0.0);
        assert_eq!(out.returns, 0.0);
        assert_eq!(out.cost, 0.0);
        assert_eq!(out.retail, 0.0);
        assert_eq!(out.attributes.category.as_deref(), Some(UNKNOWN));
        assert_eq!(out.attributes.vendor.as_deref(), Some(UNKNOWN));
    }

    #[test]
    fn test_absent_columns_are_not_synthesized() {
        let out = normalize_line(JoinedLine::default(), &[TextColumn::Territory]);
        assert_eq!(out.attributes.territory.as_deref(), Some(UNKNOWN));
        assert_eq!(out.attributes.category, None);
        assert_eq!(out.attributes.material_desc, None);
    }

    #[test]
    fn test_customer_category_is_not_defaulted() {
        let out = normalize_line(
            JoinedLine::default(),
            &[TextColumn::Territory, TextColumn::CustomerCategory],
        );
        assert_eq!(out.attributes.customer_category, None);
    }

    #[test]
    fn test_present_values_are_untouched() {
        let mut line = JoinedLine {
            group_key: Some("S1".into()),
            cost: Some(12.5),
            ..Default::default()
        };
        line.attributes.vendor = Some("DREW SHOE".into());
        let out = normalize_line(line, &TEXT_FIELDS);
        assert_eq!(out.group_key, "S1");
        assert_eq!(out.cost, 12.5);
        assert_eq!(out.attributes.vendor.as_deref(), Some("DREW SHOE"));
    }
}
