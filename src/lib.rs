//! # Top Forty Builder
//!
//! A library for turning raw ERP sales lines into ranked "Top 40" reports of
//! product styles and customers, with drill-down cross-tabulation.
//!
//! ## Core Concepts
//!
//! - **Transactions**: One row per sales line (item, customer, units, dollars, returns)
//! - **Reference Data**: Item master, customer master, and corrected cost/retail per item
//! - **Corrected Economics**: Gross profit and GM% come only from the cost/retail overrides,
//!   never from any margin the backend reports itself
//! - **Top-N Tables**: Grouped by style or customer, sorted by units, cut to 40 rows and ranked
//! - **Drill-downs**: Customers for one style, or styles for one customer, unranked and uncut
//!
//! Every query recomputes from the data source. Callers that want caching own it.
//!
//! ## Example
//!
//! ```rust,ignore
//! use top_forty_builder::*;
//!
//! let source = InMemorySource::new()
//!     .with_transactions(vec![TransactionRecord {
//!         item_id: "A".to_string(),
//!         customer_id: "X".to_string(),
//!         date: None,
//!         sales_units: Some(100.0),
//!         sales_dollars: Some(5000.0),
//!         returns: Some(5.0),
//!     }])
//!     .with_items(vec![ItemRecord {
//!         item_id: "A".to_string(),
//!         style: Some("S1".to_string()),
//!         category: Some("BOOTS".to_string()),
//!         vendor: Some("DREW SHOE".to_string()),
//!         ..Default::default()
//!     }])
//!     .with_cost_retail("A", 30.0, 50.0);
//!
//! let query = TopRankedQuery {
//!     grouping: Grouping::Style,
//!     date_range: DateRange::parse("2024-01-01", "2024-01-31").unwrap(),
//!     filters: ReportFilters::default(),
//! };
//!
//! let table = top_ranked(&source, &query).unwrap();
//! assert_eq!(table.rows[0].gm_percent, 40.0);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filters;
pub mod ingestion;
pub mod metrics;
pub mod normalize;
pub mod schema;
pub mod source;
pub mod utils;

#[cfg(feature = "netsuite")]
pub mod netsuite;

pub use config::NetSuiteConfig;
pub use engine::{process_lines, Aggregator, Reduction, TOP_N};
pub use error::{ReportError, Result};
pub use filters::apply_filters;
pub use ingestion::{join_lines, JoinPlan, JoinedLine};
pub use metrics::{derive_metrics, gm_percent};
pub use normalize::{normalize_lines, NormalizedLine};
pub use schema::*;
pub use source::{InMemorySource, SalesDataSource};
pub use utils::*;

use log::{debug, info};

pub struct ReportProcessor<'a, S: SalesDataSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: SalesDataSource + ?Sized> ReportProcessor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Top 40 styles or customers by sales units.
    pub fn top_ranked(&self, query: &TopRankedQuery) -> Result<ReportTable> {
        query.date_range.validate()?;

        info!(
            "Building top {} {} report for {} to {}",
            TOP_N,
            query.grouping.key_name(),
            query.date_range.start,
            query.date_range.end
        );

        let plan = JoinPlan::top_ranked(query.grouping);
        let source_filters = SourceFilters::for_report(&query.filters);
        let table = self.run(
            &query.date_range,
            &source_filters,
            &plan,
            &query.filters,
            Some(TOP_N),
        )?;

        info!(
            "Top {} report ready with {} row(s)",
            query.grouping.key_name(),
            table.len()
        );
        Ok(table)
    }

    /// Every customer for a style, or every style for a customer.
    pub fn drilldown(&self, query: &DrilldownQuery) -> Result<ReportTable> {
        query.date_range.validate()?;

        info!(
            "Building drill-down of {} for {} '{}'",
            query.anchor.target_grouping().key_name(),
            query.anchor.anchor_grouping().key_name(),
            query.anchor.value()
        );

        let plan = JoinPlan::drilldown(query.anchor.target_grouping());
        let source_filters = SourceFilters::for_anchor(&query.anchor);
        let table = self.run(
            &query.date_range,
            &source_filters,
            &plan,
            &ReportFilters::default(),
            None,
        )?;

        info!("Drill-down ready with {} row(s)", table.len());
        Ok(table)
    }

    pub fn top_styles(&self, date_range: DateRange, filters: ReportFilters) -> Result<ReportTable> {
        self.top_ranked(&TopRankedQuery {
            grouping: Grouping::Style,
            date_range,
            filters,
        })
    }

    pub fn top_customers(
        &self,
        date_range: DateRange,
        filters: ReportFilters,
    ) -> Result<ReportTable> {
        self.top_ranked(&TopRankedQuery {
            grouping: Grouping::Customer,
            date_range,
            filters,
        })
    }

    pub fn customers_by_style(&self, style: &str, date_range: DateRange) -> Result<ReportTable> {
        self.drilldown(&DrilldownQuery {
            anchor: DrilldownAnchor::Style(style.to_string()),
            date_range,
        })
    }

    pub fn styles_by_customer(&self, customer: &str, date_range: DateRange) -> Result<ReportTable> {
        self.drilldown(&DrilldownQuery {
            anchor: DrilldownAnchor::Customer(customer.to_string()),
            date_range,
        })
    }

    fn run(
        &self,
        date_range: &DateRange,
        source_filters: &SourceFilters,
        plan: &JoinPlan,
        filters: &ReportFilters,
        top_n: Option<usize>,
    ) -> Result<ReportTable> {
        let transactions = self
            .source
            .fetch_sales_transactions(date_range, source_filters)?;

        if transactions.is_empty() {
            info!("No transactions matched; returning an empty table");
            return Ok(ReportTable::empty(plan.grouping, top_n.is_some(), plan.columns));
        }
        debug!("Fetched {} transaction(s)", transactions.len());

        let item_ids = unique_ids(transactions.iter().map(|t| t.item_id.as_str()));

        let items = if plan.join_items {
            self.source.fetch_item_master(&item_ids)?
        } else {
            Vec::new()
        };

        let customers = if plan.join_customers {
            let customer_ids = unique_ids(transactions.iter().map(|t| t.customer_id.as_str()));
            self.source.fetch_customer_master(&customer_ids)?
        } else {
            Vec::new()
        };

        let cost_retail = self.source.fetch_cost_retail(&item_ids)?;
        debug!(
            "Reference data: {} item(s), {} customer(s), {} cost/retail override(s)",
            items.len(),
            customers.len(),
            cost_retail.len()
        );

        let joined = join_lines(&transactions, plan, &items, &customers, &cost_retail);
        let normalized = normalize_lines(joined, plan.columns);

        Ok(process_lines(normalized, plan, filters, top_n))
    }
}

pub fn top_ranked<S: SalesDataSource + ?Sized>(
    source: &S,
    query: &TopRankedQuery,
) -> Result<ReportTable> {
    ReportProcessor::new(source).top_ranked(query)
}

pub fn drilldown<S: SalesDataSource + ?Sized>(
    source: &S,
    query: &DrilldownQuery,
) -> Result<ReportTable> {
    ReportProcessor::new(source).drilldown(query)
}
