use http::StatusCode;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::config::Config;
use crate::error::WorkerError;
use crate::record::RequestDescriptor;

/// Result of one replay attempt. Every variant is per-record; none of them
/// stop the pipeline.
#[derive(Debug)]
pub enum ReplayOutcome {
    /// The target answered. Any status counts, including errors: observing
    /// the live response is the point. The body is dropped unread.
    Completed(StatusCode),
    /// The descriptor could not be turned into a well-formed request
    /// (unparsable URL, or headers that cannot be encoded).
    InvalidTarget(String),
    /// The request went out but never completed: DNS, connect, proxy, TLS or
    /// timeout failure.
    TransportError(reqwest::Error),
}

/// Build the client shared by all replays. Traffic is routed through the
/// configured egress proxy when one is set; an empty proxy URL means direct
/// connections. The timeout bounds how long a single replay can stall the
/// pipeline.
pub fn build_client(config: &Config) -> Result<reqwest::Client, WorkerError> {
    let mut builder = reqwest::Client::builder().timeout(config.request_timeout.0);

    if !config.proxy_url.is_empty() {
        let proxy =
            reqwest::Proxy::all(&config.proxy_url).map_err(|error| WorkerError::InvalidProxy {
                url: config.proxy_url.clone(),
                error,
            })?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(WorkerError::ClientBuild)
}

/// Re-issue the GET implied by `descriptor`, carrying exactly its recognized
/// headers and nothing else.
pub async fn replay(client: &reqwest::Client, descriptor: &RequestDescriptor) -> ReplayOutcome {
    let url: reqwest::Url = match descriptor.url.parse() {
        Ok(url) => url,
        Err(error) => return ReplayOutcome::InvalidTarget(error.to_string()),
    };
    let headers = match HeaderMap::try_from(&descriptor.headers) {
        Ok(headers) => headers,
        Err(error) => return ReplayOutcome::InvalidTarget(error.to_string()),
    };

    debug!(url = %url, "issuing replay");
    match client.get(url).headers(headers).send().await {
        Ok(response) => ReplayOutcome::Completed(response.status()),
        Err(error) => ReplayOutcome::TransportError(error),
    }
}
