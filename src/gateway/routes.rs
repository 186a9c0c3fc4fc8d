//! Static prefix-to-backend route table

use std::collections::BTreeMap;

use url::Url;

use crate::config::SERVICE_ROUTES;
use crate::{Error, Result};

/// One prefix mapped to one backend
#[derive(Debug, Clone)]
pub struct Route {
    /// Service name, for logs
    pub name: &'static str,
    /// Path prefix, e.g. `/pacientes`
    pub prefix: &'static str,
    /// Backend base URL
    pub target: Url,
}

impl Route {
    /// Backend URL for a request: target base path + path suffix + query.
    #[must_use]
    pub fn target_url(&self, suffix: &str, query: Option<&str>) -> Url {
        let mut url = self.target.clone();
        let path = format!("{}{suffix}", self.target.path().trim_end_matches('/'));
        url.set_path(if path.is_empty() { "/" } else { &path });
        url.set_query(query);
        url
    }
}

/// Immutable route table built once at startup
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the table from configured base URLs.
    ///
    /// Every entry of [`SERVICE_ROUTES`] must have an absolute `http(s)` URL.
    pub fn from_config(urls: &BTreeMap<String, String>) -> Result<Self> {
        let mut routes = Vec::with_capacity(SERVICE_ROUTES.len());

        for service in SERVICE_ROUTES {
            let raw = urls
                .get(service.name)
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "Missing backend URL for {} (set {})",
                        service.prefix, service.env_var
                    ))
                })?;

            let target = Url::parse(raw).map_err(|e| {
                Error::Config(format!("Invalid {} '{raw}': {e}", service.env_var))
            })?;
            if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
                return Err(Error::Config(format!(
                    "{} must be an absolute http(s) URL, got '{raw}'",
                    service.env_var
                )));
            }

            routes.push(Route {
                name: service.name,
                prefix: service.prefix,
                target,
            });
        }

        Ok(Self { routes })
    }

    /// Find the route for `path` and the remaining suffix.
    ///
    /// Prefixes match whole path segments: `/reservas/1` matches `/reservas`,
    /// `/reservasx` does not. A suffix with `.` or `..` segments, plain or
    /// percent-encoded, never resolves: the URL parser would collapse them and
    /// escape the target's base path.
    #[must_use]
    pub fn resolve<'p>(&self, path: &'p str) -> Option<(&Route, &'p str)> {
        self.routes.iter().find_map(|route| {
            let rest = path.strip_prefix(route.prefix)?;
            (rest.is_empty() || (rest.starts_with('/') && !has_dot_segment(rest)))
                .then_some((route, rest))
        })
    }

    /// All routes in match order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Number of routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Whether `path` has a `.` or `..` segment.
///
/// Matches what `Url::set_path` collapses for http(s) URLs: `%2e` is a dot
/// and a backslash separates segments.
fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}
