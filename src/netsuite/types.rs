use crate::schema::SourceFilters;
use serde::{Deserialize, Serialize};

/// Body of a RESTlet call; the `action` field selects the server handler.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RestletAction<'a> {
    TestConnection,
    GetSalesTransactions {
        start_date: String,
        end_date: String,
        filters: &'a SourceFilters,
    },
    GetItemMaster {
        item_ids: &'a [String],
    },
    GetCustomerMaster {
        customer_ids: &'a [String],
    },
    GetCostRetailData {
        item_ids: &'a [String],
    },
    ExecuteSavedSearch {
        search_id: &'a str,
        filters: &'a serde_json::Value,
    },
}

impl RestletAction<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            RestletAction::TestConnection => "test_connection",
            RestletAction::GetSalesTransactions { .. } => "get_sales_transactions",
            RestletAction::GetItemMaster { .. } => "get_item_master",
            RestletAction::GetCustomerMaster { .. } => "get_customer_master",
            RestletAction::GetCostRetailData { .. } => "get_cost_retail_data",
            RestletAction::ExecuteSavedSearch { .. } => "execute_saved_search",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestletResponse<T> {
    pub status: Option<String>,
    pub data: Option<T>,
}
