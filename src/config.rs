use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Credentials and endpoint for the NetSuite RESTlet.
#[derive(Clone, Serialize, Deserialize)]
pub struct NetSuiteConfig {
    pub account_id: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token_id: String,
    pub token_secret: String,
    #[serde(default)]
    pub restlet_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl NetSuiteConfig {
    pub fn from_env() -> Result<Self> {
        let timeout_secs = match env::var("NETSUITE_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ReportError::Configuration(format!("Invalid NETSUITE_TIMEOUT_SECS: {}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            account_id: required("NETSUITE_ACCOUNT_ID")?,
            consumer_key: required("NETSUITE_CONSUMER_KEY")?,
            consumer_secret: required("NETSUITE_CONSUMER_SECRET")?,
            token_id: required("NETSUITE_TOKEN_ID")?,
            token_secret: required("NETSUITE_TOKEN_SECRET")?,
            restlet_url: env::var("NETSUITE_RESTLET_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            timeout_secs,
        })
    }

    /// Account id in the dashed, upper-case form NetSuite uses for realms.
    pub fn normalized_account_id(&self) -> String {
        self.account_id.to_uppercase().replace('_', "-")
    }

    pub fn realm(&self) -> String {
        self.account_id.to_uppercase()
    }

    pub fn resolved_restlet_url(&self) -> String {
        match &self.restlet_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.restlets.api.netsuite.com/app/site/hosting/restlet.nl",
                self.normalized_account_id().to_lowercase()
            ),
        }
    }
}

impl fmt::Debug for NetSuiteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetSuiteConfig")
            .field("account_id", &self.account_id)
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("token_id", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .field("restlet_url", &self.restlet_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ReportError::Configuration(format!("{} not set", name)))
}
