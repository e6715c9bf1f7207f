use crate::config::NetSuiteConfig;
use crate::error::{ReportError, Result};
use crate::netsuite::oauth::{authorization_header, generate_nonce, generate_timestamp};
use crate::netsuite::types::*;
use crate::schema::{
    CostRetailTable, CustomerRecord, DateRange, ItemRecord, SourceFilters, TransactionRecord,
};
use crate::source::SalesDataSource;
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Blocking client for the reporting RESTlet deployed in NetSuite.
#[derive(Clone)]
pub struct NetSuiteClient {
    client: Client,
    config: NetSuiteConfig,
    restlet_url: String,
}

impl NetSuiteClient {
    pub fn new(config: NetSuiteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let restlet_url = config.resolved_restlet_url();

        Ok(Self {
            client,
            config,
            restlet_url,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(NetSuiteConfig::from_env()?)
    }

    pub fn restlet_url(&self) -> &str {
        &self.restlet_url
    }

    fn post<T: DeserializeOwned>(&self, action: &RestletAction<'_>) -> Result<RestletResponse<T>> {
        let header = authorization_header(
            &self.config,
            "POST",
            &self.restlet_url,
            &generate_timestamp(),
            &generate_nonce(),
        )?;

        debug!("RESTlet call: {}", action.name());

        let res = self
            .client
            .post(&self.restlet_url)
            .header(AUTHORIZATION, header)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(action)
            .send()?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text()?;
            return Err(ReportError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        Ok(res.json()?)
    }

    fn post_data<T: DeserializeOwned + Default>(&self, action: &RestletAction<'_>) -> Result<T> {
        Ok(self.post::<T>(action)?.data.unwrap_or_default())
    }

    /// Returns `true` when the RESTlet answers `status: "success"`. Failures
    /// are logged rather than returned.
    pub fn test_connection(&self) -> bool {
        match self.post::<serde_json::Value>(&RestletAction::TestConnection) {
            Ok(res) => res.status.as_deref() == Some("success"),
            Err(e) => {
                warn!("NetSuite connection test failed: {}", e);
                false
            }
        }
    }

    pub fn execute_saved_search(
        &self,
        search_id: &str,
        filters: &serde_json::Value,
    ) -> Result<Vec<serde_json::Value>> {
        self.post_data(&RestletAction::ExecuteSavedSearch { search_id, filters })
    }
}

impl SalesDataSource for NetSuiteClient {
    fn fetch_sales_transactions(
        &self,
        date_range: &DateRange,
        filters: &SourceFilters,
    ) -> Result<Vec<TransactionRecord>> {
        self.post_data(&RestletAction::GetSalesTransactions {
            start_date: date_range.start_str(),
            end_date: date_range.end_str(),
            filters,
        })
    }

    fn fetch_item_master(&self, item_ids: &[String]) -> Result<Vec<ItemRecord>> {
        self.post_data(&RestletAction::GetItemMaster { item_ids })
    }

    fn fetch_customer_master(&self, customer_ids: &[String]) -> Result<Vec<CustomerRecord>> {
        self.post_data(&RestletAction::GetCustomerMaster { customer_ids })
    }

    fn fetch_cost_retail(&self, item_ids: &[String]) -> Result<CostRetailTable> {
        self.post_data(&RestletAction::GetCostRetailData { item_ids })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_url() {
        let client = NetSuiteClient::new(NetSuiteConfig {
            account_id: "987".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            token_id: "tid".to_string(),
            token_secret: "ts".to_string(),
            restlet_url: Some("http://127.0.0.1:9/restlet".to_string()),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(client.restlet_url(), "http://127.0.0.1:9/restlet");
    }

    #[test]
    fn test_transport_failure_propagates() {
        let client = NetSuiteClient::new(NetSuiteConfig {
            account_id: "987".to_string(),
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            token_id: "tid".to_string(),
            token_secret: "ts".to_string(),
            restlet_url: Some("http://127.0.0.1:9/restlet".to_string()),
            timeout_secs: 1,
        })
        .unwrap();

        let result = client.fetch_item_master(&["A".to_string()]);
        assert!(matches!(result, Err(ReportError::Http(_))));
        assert!(!client.test_connection());
    }
}
