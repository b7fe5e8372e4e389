//! HTTP Client Factory
//!
//! Builds the reqwest client used by providers, with optional proxy support.

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client`.
///
/// - `Some(url)` -> route all traffic through that proxy (http, https or socks5)
/// - `None` -> explicitly disable proxying, ignoring env vars
pub fn build_http_client(proxy_url: Option<&str>) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    match proxy_url {
        Some(raw) => {
            let parsed = url::Url::parse(raw).map_err(|e| LlmError::InvalidRequest {
                message: format!("invalid proxy URL {}: {}", raw, e),
            })?;
            let proxy = reqwest::Proxy::all(parsed.as_str()).map_err(|e| LlmError::InvalidRequest {
                message: format!("unsupported proxy URL {}: {}", raw, e),
            })?;
            builder = builder.proxy(proxy);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().map_err(|e| LlmError::NetworkError {
        message: format!("failed to build HTTP client: {}", e),
    })
}
