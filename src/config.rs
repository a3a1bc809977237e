// src/config.rs
// Runtime configuration from WARDEN_* environment variables. The
// component is instantiated per request, so values are read fresh each
// time; there is no cached process state to invalidate.

pub const ORIGIN_URL_ENV: &str = "WARDEN_ORIGIN_URL";
pub const MEDIA_HOST_ENV: &str = "WARDEN_MEDIA_HOST";
pub const ADMIN_BASE_URL_ENV: &str = "WARDEN_ADMIN_BASE_URL";

/// Deployment configuration. Every field is optional; an empty string
/// switches the corresponding capability off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Origin base URL for media passthrough. Empty: media requests that
    /// pass enforcement answer 503 instead of being proxied.
    pub origin_url: String,
    /// Media domain whose URLs resolve to asset ids, subdomains included.
    /// Empty: no label-event URL resolves.
    pub media_host: String,
    /// Base URL the dispatcher's enforcement callouts target. Empty:
    /// every callout reports per-asset failure.
    pub admin_base_url: String,
}

impl Config {
    pub fn from_env() -> Config {
        Config {
            origin_url: trimmed_url(ORIGIN_URL_ENV),
            media_host: env_value(MEDIA_HOST_ENV),
            admin_base_url: trimmed_url(ADMIN_BASE_URL_ENV),
        }
    }
}

fn env_value(name: &str) -> String {
    std::env::var(name)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn trimmed_url(name: &str) -> String {
    env_value(name).trim_end_matches('/').to_string()
}
