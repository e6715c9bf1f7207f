use crate::schema::{FilterDimension, FilterSelection, ReportFilters, ReportTable};
use log::debug;

/// Applies every selection in `filters` to the table, combined with AND.
///
/// A selection that passes everything leaves its dimension untouched, and a
/// dimension whose column the table does not carry is skipped.
pub fn apply_filters(mut table: ReportTable, filters: &ReportFilters) -> ReportTable {
    if filters.is_unfiltered() {
        return table;
    }
    for (dimension, selection) in filters.selections() {
        table = apply_selection(table, dimension, selection);
    }
    table
}

pub fn apply_selection(
    mut table: ReportTable,
    dimension: FilterDimension,
    selection: &FilterSelection,
) -> ReportTable {
    if selection.is_all() {
        return table;
    }

    let column = match dimension.column() {
        Some(column) if table.has_column(column) => column,
        _ => {
            debug!(
                "Skipping {:?} filter: no such column in {} table",
                dimension,
                table.grouping.key_name()
            );
            return table;
        }
    };

    let before = table.rows.len();
    table.rows.retain(|row| {
        row.attributes
            .get(column)
            .map(|value| selection.matches(value))
            .unwrap_or(false)
    });
    debug!(
        "{:?} filter kept {} of {} row(s)",
        dimension,
        table.rows.len(),
        before
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attributes, Grouping, ReportRow, TextColumn};

    fn row(key: &str, category: &str, vendor: &str) -> ReportRow {
        ReportRow {
            rank: None,
            group_key: key.to_string(),
            sales_units: 1.0,
            sales_dollars: 0.0,
            returns: 0.0,
            cost: 0.0,
            retail: 0.0,
            net_units: 1.0,
            gross_profit: 0.0,
            gm_percent: 0.0,
            attributes: Attributes {
                category: Some(category.to_string()),
                vendor: Some(vendor.to_string()),
                ..Default::default()
            },
        }
    }

    fn style_table() -> ReportTable {
        ReportTable {
            grouping: Grouping::Style,
            ranked: false,
            columns: vec![TextColumn::Category, TextColumn::Vendor],
            rows: vec![
                row("S1", "BOOTS", "DREW SHOE"),
                row("S2", "CLOGS", "DREW SHOE"),
                row("S3", "BOOTS", "BELLINI"),
            ],
        }
    }

    fn keys(table: &ReportTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.group_key.as_str()).collect()
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filters = ReportFilters {
            category: FilterSelection::only(["BOOTS"]),
            vendor: FilterSelection::only(["DREW SHOE"]),
            ..Default::default()
        };
        let out = apply_filters(style_table(), &filters);
        assert_eq!(keys(&out), vec!["S1"]);
    }

    #[test]
    fn test_all_is_same_as_no_filter() {
        let with_all = ReportFilters {
            category: FilterSelection::from_values(["All", "BOOTS"]),
            ..Default::default()
        };
        let out = apply_filters(style_table(), &with_all);
        let unfiltered = apply_filters(style_table(), &ReportFilters::default());
        assert_eq!(out, unfiltered);
        assert_eq!(out.rows.len(), 3);
    }

    #[test]
    fn test_filtering_is_idempotent() {
        let filters = ReportFilters {
            category: FilterSelection::only(["BOOTS", "CLOGS"]),
            vendor: FilterSelection::only(["BELLINI"]),
            ..Default::default()
        };
        let once = apply_filters(style_table(), &filters);
        let twice = apply_filters(once.clone(), &filters);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_column_is_skipped() {
        let filters = ReportFilters {
            territory: FilterSelection::only(["WEST"]),
            brand: FilterSelection::only(["ACME"]),
            ..Default::default()
        };
        let out = apply_filters(style_table(), &filters);
        assert_eq!(out.rows.len(), 3);
    }

    #[test]
    fn test_matching_is_case_exact() {
        let filters = ReportFilters {
            category: FilterSelection::only(["boots"]),
            ..Default::default()
        };
        let out = apply_filters(style_table(), &filters);
        assert!(out.is_empty());
    }
}
