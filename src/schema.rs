use crate::error::{ReportError, Result};
use crate::ingestion::{de_lenient_f64, de_lenient_id, de_lenient_text};
use crate::utils::{format_iso_date, parse_iso_date};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Placeholder written into missing categorical values and missing group keys.
pub const UNKNOWN: &str = "Unknown";

/// Legacy wildcard value accepted by [`FilterSelection::from_values`].
pub const ALL_SENTINEL: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    #[schemars(description = "One row per product style")]
    Style,

    #[schemars(description = "One row per customer display name")]
    Customer,
}

impl Grouping {
    pub fn key_name(&self) -> &'static str {
        match self {
            Grouping::Style => "style",
            Grouping::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DrilldownAnchor {
    #[schemars(description = "List every customer that bought this style")]
    Style(String),

    #[schemars(description = "List every style this customer bought")]
    Customer(String),
}

impl DrilldownAnchor {
    pub fn anchor_grouping(&self) -> Grouping {
        match self {
            DrilldownAnchor::Style(_) => Grouping::Style,
            DrilldownAnchor::Customer(_) => Grouping::Customer,
        }
    }

    /// The grouping of the drill-down table, which is always the opposite axis.
    pub fn target_grouping(&self) -> Grouping {
        match self {
            DrilldownAnchor::Style(_) => Grouping::Customer,
            DrilldownAnchor::Customer(_) => Grouping::Style,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            DrilldownAnchor::Style(v) | DrilldownAnchor::Customer(v) => v,
        }
    }
}

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_iso_date(start)?, parse_iso_date(end)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(ReportError::InvalidDateRange {
                start: format_iso_date(self.start),
                end: format_iso_date(self.end),
            });
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn start_str(&self) -> String {
        format_iso_date(self.start)
    }

    pub fn end_str(&self) -> String {
        format_iso_date(self.end)
    }
}

/// A multi-value categorical selection.
///
/// `All` passes every row through. `Only` keeps rows whose value is an exact
/// member of the set. An empty `Only` set behaves like `All`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", content = "values", rename_all = "snake_case")]
pub enum FilterSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl FilterSelection {
    /// Builds a selection from a presentation-layer list, where an empty list
    /// or one containing `"All"` means no filtering.
    pub fn from_values<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() || values.contains(ALL_SENTINEL) {
            FilterSelection::All
        } else {
            FilterSelection::Only(values)
        }
    }

    /// Builds an explicit selection. `"All"` is treated as an ordinary value.
    pub fn only<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        FilterSelection::Only(values.into_iter().map(Into::into).collect())
    }

    pub fn is_all(&self) -> bool {
        match self {
            FilterSelection::All => true,
            FilterSelection::Only(values) => values.is_empty(),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            FilterSelection::All => true,
            FilterSelection::Only(values) => values.is_empty() || values.contains(value),
        }
    }

    /// The selected values, or `None` when the selection passes everything.
    pub fn values(&self) -> Option<Vec<String>> {
        match self {
            FilterSelection::Only(values) if !values.is_empty() => {
                Some(values.iter().cloned().collect())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    Category,
    Vendor,
    Brand,
    Territory,
}

impl FilterDimension {
    /// The aggregated-table column a dimension filters on. Brand has none.
    pub fn column(&self) -> Option<TextColumn> {
        match self {
            FilterDimension::Category => Some(TextColumn::Category),
            FilterDimension::Vendor => Some(TextColumn::Vendor),
            FilterDimension::Territory => Some(TextColumn::Territory),
            FilterDimension::Brand => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReportFilters {
    pub category: FilterSelection,
    pub vendor: FilterSelection,
    pub brand: FilterSelection,
    pub territory: FilterSelection,
}

impl ReportFilters {
    pub fn selections(&self) -> [(FilterDimension, &FilterSelection); 4] {
        [
            (FilterDimension::Category, &self.category),
            (FilterDimension::Vendor, &self.vendor),
            (FilterDimension::Brand, &self.brand),
            (FilterDimension::Territory, &self.territory),
        ]
    }

    pub fn is_unfiltered(&self) -> bool {
        self.selections().iter().all(|(_, s)| s.is_all())
    }
}

/// Filters forwarded to the remote transaction search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFilters {
    pub transaction_type: String,
    pub category: Option<Vec<String>>,
    pub vendor: Option<Vec<String>>,
    pub brand: Option<Vec<String>>,
    pub territory: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

impl SourceFilters {
    pub fn sales() -> Self {
        Self {
            transaction_type: "sales".to_string(),
            category: None,
            vendor: None,
            brand: None,
            territory: None,
            style: None,
            customer: None,
        }
    }

    pub fn for_report(filters: &ReportFilters) -> Self {
        Self {
            category: filters.category.values(),
            vendor: filters.vendor.values(),
            brand: filters.brand.values(),
            territory: filters.territory.values(),
            ..Self::sales()
        }
    }

    pub fn for_anchor(anchor: &DrilldownAnchor) -> Self {
        match anchor {
            DrilldownAnchor::Style(style) => Self {
                style: Some(style.clone()),
                ..Self::sales()
            },
            DrilldownAnchor::Customer(customer) => Self {
                customer: Some(customer.clone()),
                ..Self::sales()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TopRankedQuery {
    pub grouping: Grouping,
    pub date_range: DateRange,
    #[serde(default)]
    pub filters: ReportFilters,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DrilldownQuery {
    pub anchor: DrilldownAnchor,
    pub date_range: DateRange,
}

/// One sales line as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(deserialize_with = "de_lenient_id")]
    pub item_id: String,
    #[serde(deserialize_with = "de_lenient_id")]
    pub customer_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub sales_units: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub sales_dollars: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub returns: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(deserialize_with = "de_lenient_id")]
    pub item_id: String,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub style: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub material_desc: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub color_desc: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(deserialize_with = "de_lenient_id")]
    pub customer_id: String,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub customer: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub territory: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_text")]
    pub customer_category: Option<String>,
}

/// Corrected unit economics for an item. These are the only inputs to
/// gross profit and GM%.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CostRetail {
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub cost: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_f64")]
    pub retail: Option<f64>,
}

impl CostRetail {
    pub fn new(cost: f64, retail: f64) -> Self {
        Self {
            cost: Some(cost),
            retail: Some(retail),
        }
    }
}

pub type CostRetailTable = BTreeMap<String, CostRetail>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TextColumn {
    Category,
    Vendor,
    MaterialDesc,
    ColorDesc,
    Territory,
    CustomerCategory,
}

impl TextColumn {
    /// Whether a missing value in this column is replaced with [`UNKNOWN`].
    pub fn defaults_to_unknown(&self) -> bool {
        crate::normalize::TEXT_FIELDS.contains(self)
    }
}

/// Descriptive columns carried alongside the metrics. A `None` column is
/// either absent from the table or, for `customer_category`, never seen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Attributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub territory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_category: Option<String>,
}

impl Attributes {
    pub fn get(&self, column: TextColumn) -> Option<&str> {
        match column {
            TextColumn::Category => self.category.as_deref(),
            TextColumn::Vendor => self.vendor.as_deref(),
            TextColumn::MaterialDesc => self.material_desc.as_deref(),
            TextColumn::ColorDesc => self.color_desc.as_deref(),
            TextColumn::Territory => self.territory.as_deref(),
            TextColumn::CustomerCategory => self.customer_category.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, column: TextColumn) -> &mut Option<String> {
        match column {
            TextColumn::Category => &mut self.category,
            TextColumn::Vendor => &mut self.vendor,
            TextColumn::MaterialDesc => &mut self.material_desc,
            TextColumn::ColorDesc => &mut self.color_desc,
            TextColumn::Territory => &mut self.territory,
            TextColumn::CustomerCategory => &mut self.customer_category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportRow {
    /// 1-based position for top-N tables; `None` for drill-downs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    /// Style or customer name, depending on the table's grouping.
    pub group_key: String,
    pub sales_units: f64,
    pub sales_dollars: f64,
    pub returns: f64,
    pub cost: f64,
    pub retail: f64,
    pub net_units: f64,
    pub gross_profit: f64,
    pub gm_percent: f64,
    #[serde(flatten)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportTable {
    pub grouping: Grouping,
    pub ranked: bool,
    /// Descriptive columns present in this table.
    pub columns: Vec<TextColumn>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    pub fn empty(grouping: Grouping, ranked: bool, columns: &[TextColumn]) -> Self {
        Self {
            grouping,
            ranked,
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn has_column(&self, column: TextColumn) -> bool {
        self.columns.contains(&column)
    }

    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn find(&self, group_key: &str) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.group_key == group_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_from_values_treats_sentinel_as_all() {
        assert!(FilterSelection::from_values(["BOOTS", "All"]).is_all());
        assert!(FilterSelection::from_values(Vec::<String>::new()).is_all());
        assert!(!FilterSelection::from_values(["BOOTS"]).is_all());
    }

    #[test]
    fn test_explicit_selection_can_name_all() {
        let selection = FilterSelection::only(["All"]);
        assert!(!selection.is_all());
        assert!(selection.matches("All"));
        assert!(!selection.matches("BOOTS"));
    }

    #[test]
    fn test_report_filters_unfiltered() {
        assert!(ReportFilters::default().is_unfiltered());

        let with_sentinel = ReportFilters {
            vendor: FilterSelection::from_values(["All", "BELLINI"]),
            territory: FilterSelection::Only(BTreeSet::new()),
            ..Default::default()
        };
        assert!(with_sentinel.is_unfiltered());

        let by_brand = ReportFilters {
            brand: FilterSelection::only(["ACME"]),
            ..Default::default()
        };
        assert!(!by_brand.is_unfiltered());
    }

    #[test]
    fn test_source_filters_for_report() {
        let filters = ReportFilters {
            category: FilterSelection::from_values(["BOOTS", "CLOGS"]),
            vendor: FilterSelection::All,
            ..Default::default()
        };
        let source = SourceFilters::for_report(&filters);
        assert_eq!(source.transaction_type, "sales");
        assert_eq!(
            source.category,
            Some(vec!["BOOTS".to_string(), "CLOGS".to_string()])
        );
        assert_eq!(source.vendor, None);
        assert_eq!(source.style, None);
    }

    #[test]
    fn test_source_filters_for_anchor_serialization() {
        let source = SourceFilters::for_anchor(&DrilldownAnchor::Style("S1".to_string()));
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["style"], "S1");
        assert_eq!(json["category"], serde_json::Value::Null);
        assert!(json.get("customer").is_none());
    }

    #[test]
    fn test_date_range_rejects_inverted_window() {
        let result = DateRange::parse("2024-03-01", "2024-02-01");
        assert!(matches!(result, Err(ReportError::InvalidDateRange { .. })));
        assert!(DateRange::parse("2024-02-01", "2024-02-01").is_ok());
    }

    #[test]
    fn test_anchor_target_grouping() {
        assert_eq!(
            DrilldownAnchor::Style("S1".into()).target_grouping(),
            Grouping::Customer
        );
        assert_eq!(
            DrilldownAnchor::Customer("ACME".into()).target_grouping(),
            Grouping::Style
        );
    }

    #[test]
    fn test_top_ranked_query_from_json() {
        let query: TopRankedQuery = serde_json::from_value(serde_json::json!({
            "grouping": "customer",
            "date_range": { "start": "2024-01-01", "end": "2024-01-31" },
            "filters": { "territory": { "mode": "only", "values": ["WEST"] } }
        }))
        .unwrap();
        assert_eq!(query.grouping, Grouping::Customer);
        assert!(query.filters.category.is_all());
        assert!(query.filters.territory.matches("WEST"));
        assert!(!query.filters.territory.matches("EAST"));
    }

    #[test]
    fn test_query_schema_generation() {
        let schema = schemars::schema_for!(TopRankedQuery);
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json["properties"]["grouping"].is_object());
        assert!(json["properties"]["date_range"].is_object());
    }
}
