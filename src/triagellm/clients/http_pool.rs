//! HTTP client pool maintaining persistent connections per base URL.
//!
//! Keeps a singleton pool of `reqwest::Client` instances, one per base URL,
//! so that connections, DNS lookups, and TLS handshakes are reused across
//! requests. Both vendor adapters draw from this pool; pings and chat calls
//! to the same vendor share one connection set.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create the shared HTTP client for the given base URL.
pub fn get_http_client(base_url: &str) -> reqwest::Client {
    let mut pool = HTTP_CLIENT_POOL.lock().unwrap();

    if let Some(client) = pool.get(base_url) {
        return client.clone();
    }

    let client = reqwest::ClientBuilder::new()
        // Keep idle connections alive for 90 seconds
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        // TCP keepalive prevents silent connection drops
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .timeout(Duration::from_secs(300))
        .build()
        .expect("Failed to build HTTP client");

    pool.insert(base_url.to_string(), client.clone());
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_caches_clients_per_base_url() {
        let _first = get_http_client("https://api.example.com/v1");
        let _second = get_http_client("https://api.example.com/v1");
        let _other = get_http_client("https://other.example.com/v1");

        let pool = HTTP_CLIENT_POOL.lock().unwrap();
        assert!(pool.contains_key("https://api.example.com/v1"));
        assert!(pool.contains_key("https://other.example.com/v1"));
    }
}
