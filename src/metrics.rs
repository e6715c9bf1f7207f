use crate::schema::ReportRow;

pub fn net_units(sales_units: f64, returns: f64) -> f64 {
    sales_units - returns
}

pub fn gross_profit(retail: f64, cost: f64) -> f64 {
    retail - cost
}

/// Gross margin percent from corrected cost/retail. A non-positive retail
/// yields `0` rather than dividing.
pub fn gm_percent(retail: f64, cost: f64) -> f64 {
    if retail > 0.0 {
        (retail - cost) / retail * 100.0
    } else {
        0.0
    }
}

/// Fills the derived columns of an aggregated row. Must run on summed (or
/// first-seen) cost and retail, never on per-transaction values.
pub fn derive_metrics(row: &mut ReportRow) {
    row.net_units = net_units(row.sales_units, row.returns);
    row.gross_profit = gross_profit(row.retail, row.cost);
    row.gm_percent = gm_percent(row.retail, row.cost);
}

pub fn derive_all(rows: &mut [ReportRow]) {
    for row in rows.iter_mut() {
        derive_metrics(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Attributes;

    fn row(sales_units: f64, returns: f64, cost: f64, retail: f64) -> ReportRow {
        ReportRow {
            rank: None,
            group_key: "S1".to_string(),
            sales_units,
            sales_dollars: 0.0,
            returns,
            cost,
            retail,
            net_units: 0.0,
            gross_profit: 0.0,
            gm_percent: 0.0,
            attributes: Attributes::default(),
        }
    }

    #[test]
    fn test_derived_metrics() {
        let mut r = row(100.0, 5.0, 30.0, 50.0);
        derive_metrics(&mut r);
        assert_eq!(r.net_units, 95.0);
        assert_eq!(r.gross_profit, 20.0);
        assert!((r.gm_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_retail_has_zero_margin() {
        let mut r = row(10.0, 0.0, 30.0, 0.0);
        derive_metrics(&mut r);
        assert_eq!(r.gross_profit, -30.0);
        assert_eq!(r.gm_percent, 0.0);

        assert_eq!(gm_percent(-5.0, 3.0), 0.0);
    }

    #[test]
    fn test_negative_margin_when_cost_exceeds_retail() {
        assert!((gm_percent(40.0, 50.0) + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_returns_exceeding_sales() {
        assert_eq!(net_units(-2.0, 3.0), -5.0);
    }
}
