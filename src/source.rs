use crate::error::Result;
use crate::schema::{
    CostRetail, CostRetailTable, CustomerRecord, DateRange, ItemRecord, SourceFilters,
    TransactionRecord,
};
use std::collections::{HashMap, HashSet};

/// Read access to the ERP backend.
///
/// Implementations report transport and authentication failures as errors;
/// the report pipeline passes them through without retrying.
pub trait SalesDataSource {
    fn fetch_sales_transactions(
        &self,
        date_range: &DateRange,
        filters: &SourceFilters,
    ) -> Result<Vec<TransactionRecord>>;

    fn fetch_item_master(&self, item_ids: &[String]) -> Result<Vec<ItemRecord>>;

    fn fetch_customer_master(&self, customer_ids: &[String]) -> Result<Vec<CustomerRecord>>;

    fn fetch_cost_retail(&self, item_ids: &[String]) -> Result<CostRetailTable>;
}

impl<S: SalesDataSource + ?Sized> SalesDataSource for &S {
    fn fetch_sales_transactions(
        &self,
        date_range: &DateRange,
        filters: &SourceFilters,
    ) -> Result<Vec<TransactionRecord>> {
        (**self).fetch_sales_transactions(date_range, filters)
    }

    fn fetch_item_master(&self, item_ids: &[String]) -> Result<Vec<ItemRecord>> {
        (**self).fetch_item_master(item_ids)
    }

    fn fetch_customer_master(&self, customer_ids: &[String]) -> Result<Vec<CustomerRecord>> {
        (**self).fetch_customer_master(customer_ids)
    }

    fn fetch_cost_retail(&self, item_ids: &[String]) -> Result<CostRetailTable> {
        (**self).fetch_cost_retail(item_ids)
    }
}

/// A data source backed by records already held in memory.
///
/// Transaction searches honour the date window (for records that carry a
/// date) and the style, customer, category, vendor and territory filters,
/// resolved through the held reference data. Brand is not modelled.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub transactions: Vec<TransactionRecord>,
    pub items: Vec<ItemRecord>,
    pub customers: Vec<CustomerRecord>,
    pub cost_retail: CostRetailTable,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(mut self, transactions: Vec<TransactionRecord>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn with_items(mut self, items: Vec<ItemRecord>) -> Self {
        self.items = items;
        self
    }

    pub fn with_customers(mut self, customers: Vec<CustomerRecord>) -> Self {
        self.customers = customers;
        self
    }

    pub fn with_cost_retail(mut self, item_id: impl Into<String>, cost: f64, retail: f64) -> Self {
        self.cost_retail
            .insert(item_id.into(), CostRetail::new(cost, retail));
        self
    }

    fn matches(
        &self,
        tx: &TransactionRecord,
        date_range: &DateRange,
        filters: &SourceFilters,
        items: &HashMap<&str, &ItemRecord>,
        customers: &HashMap<&str, &CustomerRecord>,
    ) -> bool {
        if let Some(date) = tx.date {
            if !date_range.contains(date) {
                return false;
            }
        }

        let item = items.get(tx.item_id.as_str()).copied();
        let customer = customers.get(tx.customer_id.as_str()).copied();

        matches_exact(&filters.style, item.and_then(|i| i.style.as_deref()))
            && matches_exact(&filters.customer, customer.and_then(|c| c.customer.as_deref()))
            && matches_any(&filters.category, item.and_then(|i| i.category.as_deref()))
            && matches_any(&filters.vendor, item.and_then(|i| i.vendor.as_deref()))
            && matches_any(&filters.territory, customer.and_then(|c| c.territory.as_deref()))
    }
}

fn matches_exact(wanted: &Option<String>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual == Some(w.as_str()),
    }
}

fn matches_any(wanted: &Option<Vec<String>>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(values) => actual.is_some_and(|a| values.iter().any(|v| v == a)),
    }
}

impl SalesDataSource for InMemorySource {
    fn fetch_sales_transactions(
        &self,
        date_range: &DateRange,
        filters: &SourceFilters,
    ) -> Result<Vec<TransactionRecord>> {
        let items: HashMap<&str, &ItemRecord> =
            self.items.iter().map(|i| (i.item_id.as_str(), i)).collect();
        let customers: HashMap<&str, &CustomerRecord> = self
            .customers
            .iter()
            .map(|c| (c.customer_id.as_str(), c))
            .collect();

        Ok(self
            .transactions
            .iter()
            .filter(|tx| self.matches(tx, date_range, filters, &items, &customers))
            .cloned()
            .collect())
    }

    fn fetch_item_master(&self, item_ids: &[String]) -> Result<Vec<ItemRecord>> {
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        Ok(self
            .items
            .iter()
            .filter(|i| wanted.contains(i.item_id.as_str()))
            .cloned()
            .collect())
    }

    fn fetch_customer_master(&self, customer_ids: &[String]) -> Result<Vec<CustomerRecord>> {
        let wanted: HashSet<&str> = customer_ids.iter().map(String::as_str).collect();
        Ok(self
            .customers
            .iter()
            .filter(|c| wanted.contains(c.customer_id.as_str()))
            .cloned()
            .collect())
    }

    fn fetch_cost_retail(&self, item_ids: &[String]) -> Result<CostRetailTable> {
        Ok(item_ids
            .iter()
            .filter_map(|id| self.cost_retail.get(id).map(|cr| (id.clone(), *cr)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_transactions(vec![
                TransactionRecord {
                    item_id: "A".into(),
                    customer_id: "X".into(),
                    date: NaiveDate::from_ymd_opt(2024, 1, 15),
                    sales_units: Some(3.0),
                    sales_dollars: None,
                    returns: None,
                },
                TransactionRecord {
                    item_id: "B".into(),
                    customer_id: "Y".into(),
                    date: NaiveDate::from_ymd_opt(2024, 3, 1),
                    sales_units: Some(1.0),
                    sales_dollars: None,
                    returns: None,
                },
            ])
            .with_items(vec![
                ItemRecord {
                    item_id: "A".into(),
                    style: Some("S1".into()),
                    category: Some("BOOTS".into()),
                    ..Default::default()
                },
                ItemRecord {
                    item_id: "B".into(),
                    style: Some("S2".into()),
                    category: Some("CLOGS".into()),
                    ..Default::default()
                },
            ])
            .with_customers(vec![CustomerRecord {
                customer_id: "X".into(),
                customer: Some("ACME".into()),
                territory: Some("WEST".into()),
                customer_category: None,
            }])
            .with_cost_retail("A", 10.0, 20.0)
    }

    fn january() -> DateRange {
        DateRange::parse("2024-01-01", "2024-01-31").unwrap()
    }

    #[test]
    fn test_date_window() {
        let year = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
        let all = source()
            .fetch_sales_transactions(&year, &SourceFilters::sales())
            .unwrap();
        assert_eq!(all.len(), 2);

        let jan = source()
            .fetch_sales_transactions(&january(), &SourceFilters::sales())
            .unwrap();
        assert_eq!(jan.len(), 1);
        assert_eq!(jan[0].item_id, "A");
    }

    #[test]
    fn test_reference_filters() {
        let year = DateRange::parse("2024-01-01", "2024-12-31").unwrap();
        let filters = SourceFilters {
            category: Some(vec!["CLOGS".into()]),
            ..SourceFilters::sales()
        };
        let found = source().fetch_sales_transactions(&year, &filters).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, "B");

        let filters = SourceFilters {
            territory: Some(vec!["WEST".into()]),
            ..SourceFilters::sales()
        };
        let found = source().fetch_sales_transactions(&year, &filters).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_id, "X");
    }

    #[test]
    fn test_cost_retail_lookup_skips_unknown_ids() {
        let table = source()
            .fetch_cost_retail(&["A".to_string(), "Z".to_string()])
            .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table["A"], CostRetail::new(10.0, 20.0));
    }
}
