use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;

use super::DescriptorFetcher;
use crate::config::FetchConfig;
use crate::error::FetchError;

/// Blocking HTTP fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }

    fn build_client(&self, url: &str) -> Result<Client, FetchError> {
        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl DescriptorFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let response = self.build_client(url)?.get(url).send().map_err(http_err)?;
        let status = response.status();
        debug!("GET {url} -> {status}");
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(http_err)
    }
}
