//! Backend base URL resolution.

use tracing::info;

pub const PRODUCTION_BACKEND_URL: &str = "https://sliversystem-backend.onrender.com";
pub const LOCAL_BACKEND_URL: &str = "http://localhost:5000";

const STATIC_HOSTING_DOMAIN: &str = "github.io";
const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "::1", "0.0.0.0"];

/// Which rule produced the backend URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Override,
    Production,
    Local,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub source: EndpointSource,
}

impl Endpoint {
    /// First matching rule wins: explicit override, static hosting, local host, fallback.
    pub fn resolve(override_url: Option<&str>, host: &str) -> Self {
        if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
            return Self {
                base_url: url.to_string(),
                source: EndpointSource::Override,
            };
        }

        let host = normalize_host(host);
        let (base_url, source) = if is_static_hosting(&host) {
            (PRODUCTION_BACKEND_URL, EndpointSource::Production)
        } else if host.is_empty() || is_local(&host) {
            (LOCAL_BACKEND_URL, EndpointSource::Local)
        } else {
            (LOCAL_BACKEND_URL, EndpointSource::Fallback)
        };
        Self {
            base_url: base_url.to_string(),
            source,
        }
    }

    /// Joins `path` onto the base URL without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Resolves and logs the backend endpoint.
pub fn resolve_backend_url(override_url: Option<&str>, host: &str) -> Endpoint {
    let endpoint = Endpoint::resolve(override_url, host);
    info!(url = %endpoint.base_url, source = ?endpoint.source, "Resolved chat backend");
    endpoint
}

// Strips a port and IPv6 brackets, lowercases.
fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or_default().to_string();
    }
    if host.matches(':').count() == 1 {
        return host.split(':').next().unwrap_or_default().to_string();
    }
    host
}

fn is_static_hosting(host: &str) -> bool {
    host == STATIC_HOSTING_DOMAIN || host.ends_with(&format!(".{STATIC_HOSTING_DOMAIN}"))
}

fn is_local(host: &str) -> bool {
    LOCAL_HOSTS.contains(&host) || host.ends_with(".localhost")
}
