use crate::schema::{
    Attributes, CostRetailTable, CustomerRecord, Grouping, ItemRecord, TextColumn,
    TransactionRecord,
};
use crate::utils::non_blank;
use log::{debug, warn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

/// Accepts a number, a numeric string, `null`, or a blank string.
pub(crate) fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(D::Error::custom(format!("invalid numeric value '{}'", s))),
            }
        }
        Some(other) => Err(D::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}

/// Accepts a string or a number for record identifiers.
pub(crate) fn de_lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected an id string or number, found {}",
            other
        ))),
    }
}

pub(crate) fn de_lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(non_blank(Some(s))),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected text, found {}",
            other
        ))),
    }
}

/// Which reference data a query variant joins onto its transactions and
/// which descriptive columns its table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPlan {
    pub grouping: Grouping,
    pub join_items: bool,
    pub join_customers: bool,
    pub columns: &'static [TextColumn],
}

impl JoinPlan {
    pub const TOP_STYLES: JoinPlan = JoinPlan {
        grouping: Grouping::Style,
        join_items: true,
        join_customers: false,
        columns: &[
            TextColumn::MaterialDesc,
            TextColumn::ColorDesc,
            TextColumn::Category,
            TextColumn::Vendor,
        ],
    };

    pub const TOP_CUSTOMERS: JoinPlan = JoinPlan {
        grouping: Grouping::Customer,
        join_items: true,
        join_customers: true,
        columns: &[
            TextColumn::Territory,
            TextColumn::CustomerCategory,
            TextColumn::Category,
            TextColumn::Vendor,
        ],
    };

    pub const CUSTOMERS_BY_STYLE: JoinPlan = JoinPlan {
        grouping: Grouping::Customer,
        join_items: false,
        join_customers: true,
        columns: &[TextColumn::Territory],
    };

    pub const STYLES_BY_CUSTOMER: JoinPlan = JoinPlan {
        grouping: Grouping::Style,
        join_items: true,
        join_customers: false,
        columns: &[
            TextColumn::MaterialDesc,
            TextColumn::ColorDesc,
            TextColumn::Category,
            TextColumn::Vendor,
        ],
    };

    pub fn top_ranked(grouping: Grouping) -> JoinPlan {
        match grouping {
            Grouping::Style => Self::TOP_STYLES,
            Grouping::Customer => Self::TOP_CUSTOMERS,
        }
    }

    pub fn drilldown(target: Grouping) -> JoinPlan {
        match target {
            Grouping::Customer => Self::CUSTOMERS_BY_STYLE,
            Grouping::Style => Self::STYLES_BY_CUSTOMER,
        }
    }

    pub fn has_column(&self, column: TextColumn) -> bool {
        self.columns.contains(&column)
    }
}

/// A transaction with its reference data attached, before null handling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedLine {
    pub group_key: Option<String>,
    pub sales_units: Option<f64>,
    pub sales_dollars: Option<f64>,
    pub returns: Option<f64>,
    pub cost: Option<f64>,
    pub retail: Option<f64>,
    pub attributes: Attributes,
}

/// Left-joins item master, customer master and corrected cost/retail onto
/// each transaction. Unmatched ids leave the borrowed fields empty; the
/// transaction itself is always kept.
pub fn join_lines(
    transactions: &[TransactionRecord],
    plan: &JoinPlan,
    items: &[ItemRecord],
    customers: &[CustomerRecord],
    cost_retail: &CostRetailTable,
) -> Vec<JoinedLine> {
    let item_index = index_first(items, |i| i.item_id.as_str());
    let customer_index = index_first(customers, |c| c.customer_id.as_str());

    let mut missing_items = BTreeSet::new();
    let mut missing_customers = BTreeSet::new();

    let lines: Vec<JoinedLine> = transactions
        .iter()
        .map(|tx| {
            let mut line = JoinedLine {
                sales_units: tx.sales_units,
                sales_dollars: tx.sales_dollars,
                returns: tx.returns,
                ..Default::default()
            };

            if let Some(prices) = cost_retail.get(&tx.item_id) {
                line.cost = prices.cost;
                line.retail = prices.retail;
            }

            if plan.join_items {
                match item_index.get(tx.item_id.as_str()) {
                    Some(item) => attach_item(&mut line, item, plan),
                    None => {
                        missing_items.insert(tx.item_id.as_str());
                    }
                }
            }

            if plan.join_customers {
                match customer_index.get(tx.customer_id.as_str()) {
                    Some(customer) => attach_customer(&mut line, customer, plan),
                    None => {
                        missing_customers.insert(tx.customer_id.as_str());
                    }
                }
            }

            line
        })
        .collect();

    if !missing_items.is_empty() {
        warn!(
            "{} item id(s) have no item master record: {:?}",
            missing_items.len(),
            missing_items
        );
    }
    if !missing_customers.is_empty() {
        warn!(
            "{} customer id(s) have no customer master record: {:?}",
            missing_customers.len(),
            missing_customers
        );
    }
    debug!(
        "Joined {} transaction(s) for {} grouping",
        lines.len(),
        plan.grouping.key_name()
    );

    lines
}

fn index_first<'a, T, F>(records: &'a [T], key: F) -> HashMap<&'a str, &'a T>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(key(record)).or_insert(record);
    }
    index
}

fn attach_item(line: &mut JoinedLine, item: &ItemRecord, plan: &JoinPlan) {
    if plan.grouping == Grouping::Style {
        line.group_key = item.style.clone();
    }
    let borrowed = [
        (TextColumn::MaterialDesc, &item.material_desc),
        (TextColumn::ColorDesc, &item.color_desc),
        (TextColumn::Category, &item.category),
        (TextColumn::Vendor, &item.vendor),
    ];
    for (column, value) in borrowed {
        if plan.has_column(column) {
            *line.attributes.slot_mut(column) = value.clone();
        }
    }
}

fn attach_customer(line: &mut JoinedLine, customer: &CustomerRecord, plan: &JoinPlan) {
    if plan.grouping == Grouping::Customer {
        line.group_key = customer.customer.clone();
    }
    let borrowed = [
        (TextColumn::Territory, &customer.territory),
        (TextColumn::CustomerCategory, &customer.customer_category),
    ];
    for (column, value) in borrowed {
        if plan.has_column(column) {
            *line.attributes.slot_mut(column) = value.clone();
        }
    }
}
