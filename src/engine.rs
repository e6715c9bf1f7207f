use crate::filters::apply_filters;
use crate::ingestion::JoinPlan;
use crate::metrics::derive_all;
use crate::normalize::NormalizedLine;
use crate::schema::{Attributes, Grouping, ReportFilters, ReportRow, ReportTable, TextColumn};
use log::debug;
use std::collections::BTreeMap;

/// Size of every top-N table.
pub const TOP_N: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    FirstSeen,
}

/// Groups normalized lines into one row per group key.
pub struct Aggregator {
    grouping: Grouping,
    columns: &'static [TextColumn],
}

// Running totals for one group
struct GroupSlot {
    sales_units: f64,
    sales_dollars: f64,
    returns: f64,
    cost: f64,
    retail: f64,
    attributes: Attributes,
}

impl Aggregator {
    pub fn new(plan: &JoinPlan) -> Self {
        Self {
            grouping: plan.grouping,
            columns: plan.columns,
        }
    }

    /// How cost and retail collapse within a group.
    ///
    /// Style rows repeat the same per-style unit economics on every line, so
    /// the first value is kept. Customer rows span many items, so the unit
    /// economics of each line are summed into a portfolio figure.
    pub fn cost_retail_reduction(&self) -> Reduction {
        match self.grouping {
            Grouping::Style => Reduction::FirstSeen,
            Grouping::Customer => Reduction::Sum,
        }
    }

    /// Returns rows in ascending group-key order with derived metrics unset.
    /// First-seen columns follow the order of `lines`.
    pub fn aggregate(&self, lines: Vec<NormalizedLine>) -> Vec<ReportRow> {
        let reduction = self.cost_retail_reduction();
        let mut groups: BTreeMap<String, GroupSlot> = BTreeMap::new();

        for line in lines {
            match groups.get_mut(&line.group_key) {
                Some(slot) => {
                    slot.sales_units += line.sales_units;
                    slot.sales_dollars += line.sales_dollars;
                    slot.returns += line.returns;
                    if reduction == Reduction::Sum {
                        slot.cost += line.cost;
                        slot.retail += line.retail;
                    }
                    for column in self.columns {
                        let current = slot.attributes.slot_mut(*column);
                        if current.is_none() {
                            *current = line.attributes.get(*column).map(str::to_string);
                        }
                    }
                }
                None => {
                    let mut attributes = Attributes::default();
                    for column in self.columns {
                        *attributes.slot_mut(*column) =
                            line.attributes.get(*column).map(str::to_string);
                    }
                    groups.insert(
                        line.group_key,
                        GroupSlot {
                            sales_units: line.sales_units,
                            sales_dollars: line.sales_dollars,
                            returns: line.returns,
                            cost: line.cost,
                            retail: line.retail,
                            attributes,
                        },
                    );
                }
            }
        }

        groups
            .into_iter()
            .map(|(group_key, slot)| ReportRow {
                rank: None,
                group_key,
                sales_units: slot.sales_units,
                sales_dollars: slot.sales_dollars,
                returns: slot.returns,
                cost: slot.cost,
                retail: slot.retail,
                net_units: 0.0,
                gross_profit: 0.0,
                gm_percent: 0.0,
                attributes: slot.attributes,
            })
            .collect()
    }
}

/// Stable descending sort on `sales_units`; equal rows keep their order.
pub fn sort_by_sales_units(rows: &mut [ReportRow]) {
    rows.sort_by(|a, b| b.sales_units.total_cmp(&a.sales_units));
}

/// Keeps the first `limit` rows and numbers them from 1.
pub fn truncate_and_rank(rows: &mut Vec<ReportRow>, limit: usize) {
    rows.truncate(limit);
    for (idx, row) in rows.iter_mut().enumerate() {
        row.rank = Some(idx + 1);
    }
}

/// Runs everything after the join: aggregate, derive, filter, sort and, for
/// top-N tables, truncate and rank.
pub fn process_lines(
    lines: Vec<NormalizedLine>,
    plan: &JoinPlan,
    filters: &ReportFilters,
    top_n: Option<usize>,
) -> ReportTable {
    let aggregator = Aggregator::new(plan);
    let mut rows = aggregator.aggregate(lines);
    debug!(
        "Aggregated into {} {} group(s)",
        rows.len(),
        plan.grouping.key_name()
    );

    derive_all(&mut rows);

    let table = ReportTable {
        grouping: plan.grouping,
        ranked: top_n.is_some(),
        columns: plan.columns.to_vec(),
        rows,
    };
    let mut table = apply_filters(table, filters);

    sort_by_sales_units(&mut table.rows);
    if let Some(limit) = top_n {
        truncate_and_rank(&mut table.rows, limit);
    }

    table
}
