//! Route resolution for the internal registry and webhook receiver.
//!
//! Routes come from a comma-separated list of externally exposed hostnames
//! (normally the `LAGOON_ROUTES` environment variable). Resolution is pure:
//! the caller decides where the list comes from.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Environment variable holding the comma-separated route list.
pub const ROUTES_ENV: &str = "LAGOON_ROUTES";

pub const DEFAULT_REGISTRY_URL: &str = "http://172.17.0.1:8084";
pub const DEFAULT_WEBHOOK_URL: &str = "http://webhook-handler:3000";

fn registry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("harbor-nginx").expect("static pattern"))
}

fn webhook_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("webhook-handler").expect("static pattern"))
}

/// First entry of `routes` matching `pattern`. Entries are trimmed and empty
/// entries skipped.
pub fn select_route<'a>(routes: Option<&'a str>, pattern: &Regex) -> Option<&'a str> {
    routes?
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .find(|r| pattern.is_match(r))
}

/// [`select_route`] with a fallback.
pub fn resolve_route(routes: Option<&str>, pattern: &Regex, default: &str) -> String {
    select_route(routes, pattern).unwrap_or(default).to_string()
}

/// Addresses injected into the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Routes {
    /// Registry endpoint handed to builds as `INTERNAL_REGISTRY_URL`.
    pub registry_url: String,
    /// Address the registry posts webhook events to.
    pub webhook_url: String,
}

impl Routes {
    pub fn resolve(routes: Option<&str>) -> Self {
        Self {
            registry_url: resolve_route(routes, registry_pattern(), DEFAULT_REGISTRY_URL),
            webhook_url: resolve_route(routes, webhook_pattern(), DEFAULT_WEBHOOK_URL),
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self::resolve(None)
    }
}
