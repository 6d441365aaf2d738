use base64::Engine as _;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::base_url::BaseUrlResolver;
use crate::config::{Config, LogOptions};
use crate::har::OutgoingLogBody;

pub const DOCUMENTATION_HEADER: &str = "x-documentation-url";

const APPLICATION_JSON: &str = "application/json";

/// `Basic` credential derived from the API key, sent on every collector
/// call (metrics POST and identity GET alike).
pub fn encode_api_key(api_key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{}:", api_key));
    format!("Basic {}", encoded)
}

/// Serializes envelope batches and POSTs them to the collector.
pub struct HttpDataSender {
    client: reqwest::Client,
    config: Config,
    base_urls: BaseUrlResolver,
}

impl HttpDataSender {
    pub fn new(config: Config) -> Self {
        let base_urls = BaseUrlResolver::new(config.readme_api_url.clone());
        HttpDataSender {
            client: reqwest::Client::new(),
            config,
            base_urls,
        }
    }

    /// `true` means the collector accepted the batch, or the call was
    /// handed off in fire-and-forget mode. Serialization and network
    /// failures are logged and reported as `false`, never raised.
    pub async fn send(&self, batch: &[OutgoingLogBody], options: &LogOptions) -> bool {
        let body = match serde_json::to_string(batch) {
            Ok(body) => body,
            Err(e) => {
                log::error!("error while building outgoing payload: {}", e);
                return false;
            }
        };

        let credentials = encode_api_key(&self.config.api_key);
        let documentation_url = match &options.base_log_url {
            Some(url) => url.clone(),
            None => self.base_urls.resolve(&credentials).await,
        };

        let request = self
            .client
            .post(&self.config.metrics_url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .header(AUTHORIZATION, credentials)
            .header(DOCUMENTATION_HEADER, documentation_url)
            .body(body);

        if options.fire_and_forget {
            tokio::spawn(async move {
                if let Err(e) = request.send().await {
                    log::error!("error while sending outgoing payload: {}", e);
                }
            });
            return true;
        }

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                log::error!("error while sending collected data: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_encodes_with_trailing_colon() {
        // base64("owlbert:")
        assert_eq!(encode_api_key("owlbert"), "Basic b3dsYmVydDo=");
    }
}
