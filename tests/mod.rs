// tests/mod.rs
//! Test suite organization for catalog-fetch
//!
//! Unit tests live next to the code they cover. The tests here drive the
//! public API against mock HTTP servers.

#[cfg(test)]
pub mod integration;

/// Common test utilities and helpers
#[cfg(test)]
pub mod common {
    use catalog_fetch::{
        ApiToken, CatalogEndpoint, CatalogFetcher, CatalogHttpClient, ConnectionConfig,
        FetchConfig, RetryPolicy, Scheme,
    };
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    pub const TEST_TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";
    pub const DEVICES: &str = "dcim/devices/";

    /// A plain-http connection to a local mock server.
    pub fn connection(address: SocketAddr) -> ConnectionConfig {
        ConnectionConfig::new(address.ip().to_string())
            .expect("Test host should be valid")
            .with_scheme(Scheme::Http)
            .with_port(address.port())
            .with_token(ApiToken::new(TEST_TOKEN).expect("Test token should be valid"))
    }

    /// Short timeout, no sleep between attempts.
    pub fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(300),
            max_retries,
            sleep: Duration::ZERO,
        }
    }

    pub fn fetcher(
        address: SocketAddr,
        fetch: FetchConfig,
        retry: RetryPolicy,
    ) -> CatalogFetcher {
        let connection = connection(address);
        let client =
            CatalogHttpClient::new(&connection, &retry).expect("Test client should build");
        let endpoint =
            CatalogEndpoint::from_connection(&connection).expect("Test endpoint should be valid");
        CatalogFetcher::new(Arc::new(client), endpoint, DEVICES, fetch, retry)
    }

    /// A `{count, results}` body for devices with the given ids.
    pub fn page(count: usize, ids: impl IntoIterator<Item = i64>) -> Value {
        let results: Vec<Value> = ids
            .into_iter()
            .map(|id| json!({ "id": id, "name": format!("device-{}", id) }))
            .collect();
        json!({ "count": count, "next": null, "previous": null, "results": results })
    }
}
